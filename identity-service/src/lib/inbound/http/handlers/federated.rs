use axum::extract::Query;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::domain::identity::models::TokenPair;
use crate::identity::ports::AuthServicePort;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Redirect the browser to the provider's consent page.
pub async fn google_authorize<CS>(State(state): State<AppState<CS>>) -> Redirect
where
    CS: CredentialStore,
{
    Redirect::temporary(&state.google.authorize_url())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleCallbackQuery {
    code: String,
}

/// Provider callback: exchange the authorization code, sign the user in,
/// and hand the token pair to the frontend via the redirect query string.
///
/// The tokens are JWTs and therefore URL-safe as-is. Failures redirect
/// with an opaque error code; the detail stays in the log.
pub async fn google_callback<CS>(
    State(state): State<AppState<CS>>,
    Query(query): Query<GoogleCallbackQuery>,
) -> Redirect
where
    CS: CredentialStore,
{
    match complete_google_login(&state, query.code).await {
        Ok(pair) => Redirect::temporary(&format!(
            "{}?accessToken={}&refreshToken={}",
            state.frontend_url, pair.access_token, pair.refresh_token
        )),
        Err(e) => {
            tracing::warn!(error = %e, "Federated login failed");
            Redirect::temporary(&format!(
                "{}?error=federated_login_failed",
                state.frontend_url
            ))
        }
    }
}

async fn complete_google_login<CS>(
    state: &AppState<CS>,
    code: String,
) -> Result<TokenPair, anyhow::Error>
where
    CS: CredentialStore,
{
    let profile = state.google.exchange_code(code).await?;
    let (_identity, pair) = state.auth_engine.login_federated(profile).await?;
    Ok(pair)
}
