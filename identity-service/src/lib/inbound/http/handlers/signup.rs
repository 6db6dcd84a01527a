use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use thiserror::Error;

use super::ApiError;
use super::ApiSuccess;
use super::AuthResponseData;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Password;
use crate::domain::identity::models::SignupCommand;
use crate::identity::errors::DisplayNameError;
use crate::identity::errors::EmailError;
use crate::identity::errors::PasswordPolicyError;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

pub async fn signup<CS>(
    State(state): State<AppState<CS>>,
    Json(body): Json<SignupRequest>,
) -> Result<ApiSuccess<AuthResponseData>, ApiError>
where
    CS: CredentialStore,
{
    let (identity, pair) = state.auth_engine.signup(body.try_into_command()?).await?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        AuthResponseData::new(&identity, &pair),
    ))
}

/// HTTP request body for registration (raw JSON).
///
/// There is no role field to accept: every new account is a `user`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignupRequest {
    email: String,
    password: String,
    name: String,
}

#[derive(Debug, Clone, Error)]
enum ParseSignupRequestError {
    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Invalid password: {0}")]
    Password(#[from] PasswordPolicyError),

    #[error("Invalid name: {0}")]
    Name(#[from] DisplayNameError),
}

impl SignupRequest {
    fn try_into_command(self) -> Result<SignupCommand, ParseSignupRequestError> {
        let email = EmailAddress::new(self.email)?;
        let password = Password::new(self.password)?;
        let name = DisplayName::new(self.name)?;
        Ok(SignupCommand::new(email, password, name))
    }
}

impl From<ParseSignupRequestError> for ApiError {
    fn from(err: ParseSignupRequestError) -> Self {
        ApiError::UnprocessableEntity(err.to_string())
    }
}
