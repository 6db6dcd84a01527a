use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use crate::domain::identity::models::EmailAddress;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

pub async fn login<CS>(
    State(state): State<AppState<CS>>,
    Json(body): Json<LoginRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError>
where
    CS: CredentialStore,
{
    // A malformed email cannot belong to an account; report it exactly like
    // any other failed credential rather than revealing it never matched.
    let email = EmailAddress::new(body.email)
        .map_err(|_| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let (identity, pair) = state.auth_engine.login(&email, &body.password).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AuthResponseData::new(&identity, &pair),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}
