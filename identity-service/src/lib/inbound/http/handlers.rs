use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::domain::identity::models::Identity;
use crate::domain::identity::models::Role;
use crate::domain::identity::models::TokenPair;
use crate::identity::errors::AuthError;

pub mod delete_identity;
pub mod federated;
pub mod get_current_identity;
pub mod list_identities;
pub mod login;
pub mod logout;
pub mod refresh_token;
pub mod signup;
pub mod update_profile;
pub mod update_role;

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize + PartialEq>(StatusCode, Json<ApiResponseBody<T>>);

impl<T> PartialEq for ApiSuccess<T>
where
    T: Serialize + PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1 .0 == other.1 .0
    }
}

impl<T: Serialize + PartialEq> ApiSuccess<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(ApiResponseBody::new(status, data)))
    }
}

impl<T: Serialize + PartialEq> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        };

        (status, Json(ApiResponseBody::new_error(status, message))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::EmailAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid credentials".to_string())
            }
            AuthError::InvalidRefreshToken => {
                ApiError::Unauthorized("Invalid refresh token".to_string())
            }
            AuthError::InvalidIdentityId(_)
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidName(_)
            | AuthError::InvalidPassword(_)
            | AuthError::InvalidRole(_) => ApiError::UnprocessableEntity(err.to_string()),
            AuthError::Password(_)
            | AuthError::Token(_)
            | AuthError::Store(_)
            | AuthError::Unknown(_) => {
                // Internals are logged, never echoed to the client
                tracing::error!(error = %err, "Internal error");
                ApiError::InternalServerError("Internal server error".to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    status_code: u16,
    data: T,
}

impl<T: Serialize + PartialEq> ApiResponseBody<T> {
    pub fn new(status_code: StatusCode, data: T) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data,
        }
    }
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}

/// Non-sensitive identity view returned by the API.
///
/// Built by copying fields explicitly; the password hash and the stored
/// refresh token are not carried, so they cannot leak through
/// serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityData {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub federated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for IdentityData {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.to_string(),
            email: identity.email.as_str().to_string(),
            name: identity.name.as_str().to_string(),
            role: identity.role,
            federated: identity.federated_id.is_some(),
            created_at: identity.created_at,
        }
    }
}

/// Token pair as handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPairData {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<&TokenPair> for TokenPairData {
    fn from(pair: &TokenPair) -> Self {
        Self {
            access_token: pair.access_token.clone(),
            refresh_token: pair.refresh_token.clone(),
        }
    }
}

/// Response shape shared by signup, login, and federated login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthResponseData {
    pub identity: IdentityData,
    pub tokens: TokenPairData,
}

impl AuthResponseData {
    pub fn new(identity: &Identity, pair: &TokenPair) -> Self {
        Self {
            identity: identity.into(),
            tokens: pair.into(),
        }
    }
}
