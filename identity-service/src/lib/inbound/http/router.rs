use std::sync::Arc;
use std::time::Duration;

use auth::TokenCodec;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::delete;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_identity::delete_identity;
use super::handlers::federated::google_authorize;
use super::handlers::federated::google_callback;
use super::handlers::get_current_identity::get_current_identity;
use super::handlers::list_identities::list_identities;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::refresh_token::refresh_token;
use super::handlers::signup::signup;
use super::handlers::update_profile::update_profile;
use super::handlers::update_role::update_role;
use super::middleware::authenticate;
use super::middleware::require_admin;
use crate::domain::identity::service::AuthEngine;
use crate::identity::ports::CredentialStore;
use crate::outbound::oauth::GoogleOAuthClient;

pub struct AppState<CS>
where
    CS: CredentialStore,
{
    pub auth_engine: Arc<AuthEngine<CS>>,
    pub token_codec: Arc<TokenCodec>,
    pub google: Arc<GoogleOAuthClient>,
    pub frontend_url: String,
}

// Derived Clone would demand CS: Clone; the state is all shared handles.
impl<CS> Clone for AppState<CS>
where
    CS: CredentialStore,
{
    fn clone(&self) -> Self {
        Self {
            auth_engine: Arc::clone(&self.auth_engine),
            token_codec: Arc::clone(&self.token_codec),
            google: Arc::clone(&self.google),
            frontend_url: self.frontend_url.clone(),
        }
    }
}

pub fn create_router<CS>(
    auth_engine: Arc<AuthEngine<CS>>,
    token_codec: Arc<TokenCodec>,
    google: Arc<GoogleOAuthClient>,
    frontend_url: String,
) -> Router
where
    CS: CredentialStore,
{
    let state = AppState {
        auth_engine,
        token_codec,
        google,
        frontend_url,
    };

    let public_routes = Router::new()
        .route("/api/auth/signup", post(signup::<CS>))
        .route("/api/auth/login", post(login::<CS>))
        .route("/api/auth/refresh-token", post(refresh_token::<CS>))
        .route("/api/auth/logout", post(logout::<CS>))
        .route("/api/auth/google", get(google_authorize::<CS>))
        .route("/api/auth/google/callback", get(google_callback::<CS>));

    let protected_routes = Router::new()
        .route("/api/identities/me", get(get_current_identity::<CS>))
        .route("/api/identities/me", patch(update_profile::<CS>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<CS>,
        ));

    // require_admin is added first so authenticate wraps it and runs first
    let admin_routes = Router::new()
        .route("/api/identities", get(list_identities::<CS>))
        .route("/api/identities/:identity_id/role", patch(update_role::<CS>))
        .route("/api/identities/:identity_id", delete(delete_identity::<CS>))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate::<CS>,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
