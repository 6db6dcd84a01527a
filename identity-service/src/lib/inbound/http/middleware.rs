use std::str::FromStr;

use auth::TokenType;
use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::{self};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use serde_json::json;

use crate::domain::identity::models::IdentityId;
use crate::domain::identity::models::Role;
use crate::identity::ports::CredentialStore;
use crate::inbound::http::router::AppState;

/// Extension type carrying the authenticated identity through the request
#[derive(Debug, Clone)]
pub struct CurrentIdentity {
    pub id: IdentityId,
    pub role: Role,
}

/// Middleware that validates the bearer access token and attaches the
/// caller's identity to the request extensions.
///
/// Every rejection path produces the same response body; the concrete
/// reason (missing header, malformed, expired, wrong token type) only goes
/// to the log, so the endpoint cannot be probed to learn which check
/// failed.
pub async fn authenticate<CS>(
    State(state): State<AppState<CS>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response>
where
    CS: CredentialStore,
{
    let token = extract_bearer_token(&req).map_err(|reason| {
        tracing::warn!(reason, "Authentication rejected");
        unauthenticated_response()
    })?;

    let claims = state.token_codec.verify(token).map_err(|e| {
        tracing::warn!(error = %e, "Access token failed verification");
        unauthenticated_response()
    })?;

    // A refresh token is only good for the refresh endpoint, never as a
    // bearer credential.
    if claims.token_type != TokenType::Access {
        tracing::warn!("Non-access token presented as bearer credential");
        return Err(unauthenticated_response());
    }

    let id = IdentityId::from_string(&claims.sub).map_err(|e| {
        tracing::warn!(error = %e, "Token subject is not a valid identity id");
        unauthenticated_response()
    })?;

    let role = Role::from_str(&claims.role).map_err(|e| {
        tracing::warn!(error = %e, "Token carries an unknown role");
        unauthenticated_response()
    })?;

    req.extensions_mut().insert(CurrentIdentity { id, role });

    Ok(next.run(req).await)
}

/// Middleware gating admin-only routes.
///
/// Runs after `authenticate`, so a missing extension means the route was
/// wired without authentication. Authorization failure is a distinct 403:
/// unlike token verification, the two failure classes here must stay
/// distinguishable to callers.
pub async fn require_admin(req: Request, next: Next) -> Result<Response, Response> {
    match req.extensions().get::<CurrentIdentity>() {
        Some(current) if current.role == Role::Admin => Ok(next.run(req).await),
        Some(current) => {
            tracing::warn!(identity_id = %current.id, "Admin route denied");
            Err((
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "Admin access required"
                })),
            )
                .into_response())
        }
        None => Err(unauthenticated_response()),
    }
}

fn unauthenticated_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "Authentication required"
        })),
    )
        .into_response()
}

fn extract_bearer_token(req: &Request) -> Result<&str, &'static str> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .ok_or("missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "non-ASCII Authorization header")?;

    auth_str
        .strip_prefix("Bearer ")
        .ok_or("malformed Authorization header")
}
