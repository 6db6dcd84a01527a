use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::middleware::CurrentIdentity;
use crate::inbound::http::router::AppState;

/// Return the authenticated caller's own profile.
pub async fn get_current_identity<CS>(
    State(state): State<AppState<CS>>,
    Extension(current): Extension<CurrentIdentity>,
) -> Result<ApiSuccess<IdentityData>, ApiError>
where
    CS: CredentialStore,
{
    let identity = state.auth_engine.get_identity(&current.id).await?;

    Ok(ApiSuccess::new(StatusCode::OK, IdentityData::from(&identity)))
}
