use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// End the session holding this refresh token.
///
/// Idempotent: an unknown or already-cleared token still answers 200.
pub async fn logout<CS>(
    State(state): State<AppState<CS>>,
    Json(body): Json<LogoutRequest>,
) -> Result<ApiSuccess<LogoutResponseData>, ApiError>
where
    CS: CredentialStore,
{
    if body.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token required".to_string()));
    }

    state.auth_engine.logout(&body.refresh_token).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        LogoutResponseData {
            message: "Logged out successfully".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutRequest {
    refresh_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogoutResponseData {
    pub message: String,
}
