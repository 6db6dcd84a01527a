use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::AuthUrl;
use oauth2::AuthorizationCode;
use oauth2::ClientId;
use oauth2::ClientSecret;
use oauth2::CsrfToken;
use oauth2::RedirectUrl;
use oauth2::Scope;
use oauth2::TokenResponse;
use oauth2::TokenUrl;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::FederatedProfile;

const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Error type for federated-provider operations.
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Invalid OAuth configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Authorization code exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Profile fetch failed: {0}")]
    ProfileFetchFailed(String),

    #[error("Provider returned an unusable profile: {0}")]
    InvalidProfile(String),
}

/// Google OAuth client for the authorization-code flow.
///
/// The provider authenticates the user; we only consume the resulting
/// profile, qualified as `google:<subject>` for the federated id.
pub struct GoogleOAuthClient {
    client: BasicClient,
    http: reqwest::Client,
}

/// Subset of the OpenID Connect userinfo response we consume.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: String,
    name: Option<String>,
}

impl GoogleOAuthClient {
    /// Build the client from deployment configuration.
    ///
    /// # Errors
    /// * `InvalidConfiguration` - An endpoint or redirect URL failed to parse
    pub fn new(config: &GoogleConfig) -> Result<Self, OAuthError> {
        let auth_url = AuthUrl::new(AUTH_ENDPOINT.to_string())
            .map_err(|e| OAuthError::InvalidConfiguration(e.to_string()))?;
        let token_url = TokenUrl::new(TOKEN_ENDPOINT.to_string())
            .map_err(|e| OAuthError::InvalidConfiguration(e.to_string()))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| OAuthError::InvalidConfiguration(e.to_string()))?;

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
        })
    }

    /// Build the provider consent URL the browser is redirected to.
    pub fn authorize_url(&self) -> String {
        let (url, _csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .url();

        url.to_string()
    }

    /// Exchange the callback authorization code and fetch the user's
    /// profile from the userinfo endpoint.
    ///
    /// # Errors
    /// * `ExchangeFailed` - Provider rejected the code exchange
    /// * `ProfileFetchFailed` - Userinfo request failed
    /// * `InvalidProfile` - Profile fields failed domain validation
    pub async fn exchange_code(&self, code: String) -> Result<FederatedProfile, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|e| OAuthError::ExchangeFailed(e.to_string()))?;

        let info: GoogleUserInfo = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| OAuthError::ProfileFetchFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| OAuthError::ProfileFetchFailed(e.to_string()))?;

        let email = EmailAddress::new(info.email)
            .map_err(|e| OAuthError::InvalidProfile(e.to_string()))?;
        // Some accounts carry no display name; fall back to the address
        let name = info.name.unwrap_or_else(|| email.as_str().to_string());
        let name =
            DisplayName::new(name).map_err(|e| OAuthError::InvalidProfile(e.to_string()))?;

        Ok(FederatedProfile {
            federated_id: format!("google:{}", info.sub),
            email,
            name,
        })
    }
}
