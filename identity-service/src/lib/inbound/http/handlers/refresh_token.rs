use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::TokenPairData;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Exchange a refresh token for a fresh pair.
///
/// Rotation makes the presented token single-use, so clients must not
/// retry this call blindly after a timeout: the first attempt may already
/// have rotated the token away.
pub async fn refresh_token<CS>(
    State(state): State<AppState<CS>>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<ApiSuccess<TokenPairData>, ApiError>
where
    CS: CredentialStore,
{
    if body.refresh_token.is_empty() {
        return Err(ApiError::BadRequest("Refresh token required".to_string()));
    }

    let pair = state.auth_engine.refresh(&body.refresh_token).await?;

    Ok(ApiSuccess::new(StatusCode::OK, TokenPairData::from(&pair)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RefreshTokenRequest {
    refresh_token: String,
}
