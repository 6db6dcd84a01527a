use axum::extract::State;
use axum::http::StatusCode;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// List every registered identity. Admin only.
pub async fn list_identities<CS>(
    State(state): State<AppState<CS>>,
) -> Result<ApiSuccess<Vec<IdentityData>>, ApiError>
where
    CS: CredentialStore,
{
    let identities = state.auth_engine.list_identities().await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        identities.iter().map(IdentityData::from).collect(),
    ))
}
