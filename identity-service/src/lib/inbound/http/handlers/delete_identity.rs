use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::IdentityId;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Delete the target identity. Admin only.
pub async fn delete_identity<CS>(
    State(state): State<AppState<CS>>,
    Path(identity_id): Path<String>,
) -> Result<ApiSuccess<DeleteIdentityResponseData>, ApiError>
where
    CS: CredentialStore,
{
    let id = IdentityId::from_string(&identity_id)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    state.auth_engine.delete_identity(&id).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        DeleteIdentityResponseData {
            message: "Identity deleted successfully".to_string(),
        },
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteIdentityResponseData {
    pub message: String,
}
