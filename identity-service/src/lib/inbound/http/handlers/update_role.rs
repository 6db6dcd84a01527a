use std::str::FromStr;

use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Change the target identity's role. Admin only.
///
/// Tokens the target already holds keep their old role snapshot until they
/// expire; tokens issued afterwards carry the new role.
pub async fn update_role<CS>(
    State(state): State<AppState<CS>>,
    Path(identity_id): Path<String>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<ApiSuccess<IdentityData>, ApiError>
where
    CS: CredentialStore,
{
    let id = IdentityId::from_string(&identity_id)
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;

    let role =
        Role::from_str(&body.role).map_err(|_| ApiError::BadRequest("Invalid role".to_string()))?;

    let identity = state.auth_engine.update_role(&id, role).await?;

    Ok(ApiSuccess::new(StatusCode::OK, IdentityData::from(&identity)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateRoleRequest {
    role: String,
}
