//! Session gate: runs ahead of every request and decides allow / redirect-to-login.
//!
//! - public path (login page, auth endpoints, static assets) -> allowed, no cookie needed
//! - no session cookie -> redirect to `/login?from=<path+query>` (plain `/login` for `/`)
//! - cookie present but signature invalid or expired -> redirect to `/login` without `from`
//! - cookie verifies -> the decoded user is attached as a `RequestContext` and the
//!   request continues
//!
//! The check is stateless: every request re-verifies its token.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, warn};

use super::{session_token, AppState};
use crate::error::{AppError, FORBIDDEN_MSG};
use crate::identity::{action_for_method, is_allowed, RequestContext};

pub const LOGIN_PATH: &str = "/login";

/// Paths reachable without a session.
pub const PUBLIC_PATHS: &[&str] = &["/login", "/api/auth/login", "/api/auth/me", "/api/auth/logout", "/favicon.ico"];

/// Static asset trees, also public.
pub const STATIC_PREFIXES: &[&str] = &["/static", "/images"];

fn matches_prefix(path: &str, prefix: &str) -> bool {
    path == prefix || path.strip_prefix(prefix).map(|rest| rest.starts_with('/')).unwrap_or(false)
}

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.iter().chain(STATIC_PREFIXES.iter()).any(|p| matches_prefix(path, p))
}

/// Login URL carrying the original path (and query) as the return target.
pub fn login_redirect_target(path: &str, query: Option<&str>) -> String {
    if path == "/" {
        return LOGIN_PATH.to_string();
    }
    let from = match query {
        Some(q) if !q.is_empty() => format!("{}?{}", path, q),
        _ => path.to_string(),
    };
    // '/' is legal inside a query component; keep it readable
    let encoded = urlencoding::encode(&from).replace("%2F", "/");
    format!("{}?from={}", LOGIN_PATH, encoded)
}

pub async fn session_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    if is_public(&path) {
        return next.run(req).await;
    }
    let Some(token) = session_token(req.headers()) else {
        let target = login_redirect_target(&path, req.uri().query());
        debug!(target: "gate", path = %path, redirect = %target, "no session");
        return Redirect::to(&target).into_response();
    };
    match state.codec().verify(&token) {
        Ok(user) => {
            req.extensions_mut().insert(RequestContext { user, path });
            next.run(req).await
        }
        Err(e) => {
            // bad signature and expiry are not distinguished for the client
            debug!(target: "gate", path = %path, reason = %e, "session rejected");
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

/// Role check for requests that passed the gate: mutations need the admin role.
pub async fn enforce_role(req: Request, next: Next) -> Response {
    if let Some(ctx) = req.extensions().get::<RequestContext>() {
        let action = action_for_method(req.method());
        if !is_allowed(ctx.user.role, action) {
            warn!(target: "gate", email = %ctx.user.email, path = %ctx.path, action = ?action, "forbidden for role");
            return AppError::forbidden("forbidden", FORBIDDEN_MSG).into_response();
        }
    }
    next.run(req).await
}
