use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::IdentityData;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::UpdateProfileCommand;
use crate::identity::errors::DisplayNameError;
use crate::identity::errors::EmailError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::middleware::CurrentIdentity;
use crate::inbound::http::router::AppState;

/// Update the authenticated caller's own profile (name and/or email).
pub async fn update_profile<CS>(
    State(state): State<AppState<CS>>,
    Extension(current): Extension<CurrentIdentity>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<ApiSuccess<IdentityData>, ApiError>
where
    CS: CredentialStore,
{
    let identity = state
        .auth_engine
        .update_profile(&current.id, body.try_into_command()?)
        .await?;

    Ok(ApiSuccess::new(StatusCode::OK, IdentityData::from(&identity)))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateProfileRequest {
    email: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum ParseUpdateProfileRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid name: {0}")]
    Name(#[from] DisplayNameError),
}

impl UpdateProfileRequest {
    fn try_into_command(self) -> Result<UpdateProfileCommand, ParseUpdateProfileRequestError> {
        let email = self.email.map(EmailAddress::new).transpose()?;
        let name = self.name.map(DisplayName::new).transpose()?;
        Ok(UpdateProfileCommand { email, name })
    }
}

impl From<ParseUpdateProfileRequestError> for ApiError {
    fn from(err: ParseUpdateProfileRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
