//!
//! apolices HTTP server
//! --------------------
//! Axum-based front door for the policy registry. The domain data (people, properties,
//! policies, attachments) lives behind an external REST API; this server owns only the
//! session layer in front of the pages.
//!
//! Responsibilities:
//! - Login/logout/who-am-i endpoints backed by the `identity` module.
//! - Signed session token carried in an HttpOnly `session` cookie.
//! - Session gate in front of every non-public path, plus the admin-only check on mutations.
//! - Login page, application shell and static assets.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::{debug, error, info};

use crate::config::ServerConfig;
use crate::error::{AppError, AuthError};
use crate::identity::{CredentialStore, LocalAuthProvider, SessionCodec};

pub mod assets;
pub mod gate;
pub mod pages;

pub const SESSION_COOKIE: &str = "session";

/// Attributes of the session cookie, fixed at startup.
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub max_age_secs: i64,
    pub secure: bool,
}

/// Shared server state injected into all handlers and the gate.
///
/// Everything in here is read-only after startup, so clones are shared across
/// concurrently handled requests without locking.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<LocalAuthProvider>,
    pub cookie: CookieSettings,
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    /// Build state from configuration. The credential list is parsed (and its plaintext
    /// passwords hashed) here, once.
    pub fn from_config(cfg: &ServerConfig) -> Result<Self, AuthError> {
        let codec = SessionCodec::from_config(&cfg.auth)?;
        let store = CredentialStore::from_json(cfg.auth.users_json.as_deref());
        Ok(Self {
            auth: Arc::new(LocalAuthProvider::new(store, codec)),
            cookie: CookieSettings { max_age_secs: cfg.auth.session_max_age_secs(), secure: cfg.auth.production },
            static_dir: Arc::new(cfg.static_dir.clone()),
        })
    }

    pub fn codec(&self) -> &SessionCodec { &self.auth.codec }
}

/// Mount every route behind the session gate.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", get(pages::login_page))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
        .route("/favicon.ico", get(assets::favicon))
        .route("/static/{*path}", get(assets::static_file))
        .route("/images/{*path}", get(assets::image_file))
        .fallback(pages::app_shell)
        // layers run bottom-up: the gate first, then the role check
        .layer(middleware::from_fn(gate::enforce_role))
        .layer(middleware::from_fn_with_state(state.clone(), gate::session_gate))
        .with_state(state)
}

fn log_startup(cfg: &ServerConfig, state: &AppState) {
    let users = state.auth.store.len();
    for u in state.auth.store.list_users() {
        debug!(target: "startup", email = %u.email, role = %u.role, has_password = u.password().is_some(), "configured user");
    }
    info!(
        target: "startup",
        "apolices starting: bind={}, http_port={}, static_dir={:?}, session_days={}, secure_cookie={}, users={}",
        cfg.bind, cfg.http_port, cfg.static_dir, cfg.auth.session_days, cfg.auth.production, users
    );
    if users == 0 {
        tracing::warn!(target: "startup", "no users configured; every login will be rejected");
    }
}

/// Start the HTTP server with a fully resolved configuration.
pub async fn run_with_config(cfg: ServerConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&cfg).context("while building session state")?;
    log_startup(&cfg, &state);
    let addr: SocketAddr = format!("{}:{}", cfg.bind, cfg.http_port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", cfg.bind, cfg.http_port))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Starting server on {}", addr);
    serve(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Resolve configuration from the environment and run. Missing signing secret aborts here.
pub async fn run() -> anyhow::Result<()> {
    let cfg = ServerConfig::from_env().context("invalid configuration")?;
    run_with_config(cfg).await
}

/// Find a cookie by name across all `Cookie` headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all(header::COOKIE).iter() {
        let Ok(s) = cookie.to_str() else { continue; };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k.trim() == name { return Some(v.trim().to_string()); }
            }
        }
    }
    None
}

/// The session token from the request, if a non-empty one is present.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    parse_cookie(headers, SESSION_COOKIE).filter(|t| !t.is_empty())
}

pub fn set_session_cookie(token: &str, settings: CookieSettings) -> Result<HeaderValue, AppError> {
    let mut v = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE, token, settings.max_age_secs
    );
    if settings.secure { v.push_str("; Secure"); }
    HeaderValue::from_str(&v).map_err(|e| AppError::internal("internal".to_string(), e.to_string()))
}

pub fn clear_session_cookie(settings: CookieSettings) -> HeaderValue {
    let v = if settings.secure {
        "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure"
    } else {
        "session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0"
    };
    HeaderValue::from_static(v)
}

/// Any JSON body is accepted regardless of `Content-Type`; only a body that is not JSON
/// at all is a 400. Missing or non-string fields fall through to the 401 path.
async fn login(State(state): State<AppState>, body: Bytes) -> Response {
    let body: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => return AppError::user("bad_request".to_string(), format!("invalid JSON body: {}", e)).into_response(),
    };
    let provider = state.auth.clone();
    // Argon2 verification is CPU-bound; keep it off the async workers.
    let outcome = match tokio::task::spawn_blocking(move || provider.login_json(&body)).await {
        Ok(r) => r,
        Err(e) => {
            error!("login task failed: {e}");
            return AppError::internal("internal", "internal server error").into_response();
        }
    };
    match outcome {
        Ok(resp) => {
            let cookie = match set_session_cookie(resp.token.as_str(), state.cookie) {
                Ok(c) => c,
                Err(e) => return e.into_response(),
            };
            let mut headers = HeaderMap::new();
            headers.insert(header::SET_COOKIE, cookie);
            (StatusCode::OK, headers, Json(serde_json::json!({ "ok": true, "user": resp.user }))).into_response()
        }
        Err(e) => {
            if !matches!(e, AuthError::InvalidCredentials) { error!("login error: {e}"); }
            AppError::from(e).into_response()
        }
    }
}

/// Who-am-i: always 200, `{user: null}` on any failure.
async fn me(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let Some(token) = session_token(&headers) else {
        return Json(serde_json::json!({ "user": null }));
    };
    match state.codec().verify_claims_at(&token, Utc::now()) {
        Ok(claims) => Json(serde_json::json!({ "user": claims })),
        Err(e) => {
            debug!(target: "auth", reason = %e, "who-am-i rejected session");
            Json(serde_json::json!({ "user": null }))
        }
    }
}

async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let mut h = HeaderMap::new();
    h.insert(header::SET_COOKIE, clear_session_cookie(state.cookie));
    (StatusCode::OK, h, Json(serde_json::json!({ "ok": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(cookies: &[&str]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for c in cookies {
            h.append(header::COOKIE, HeaderValue::from_str(c).unwrap());
        }
        h
    }

    #[test]
    fn parse_cookie_finds_named_value() {
        let h = headers_with(&["theme=dark; session=abc.def.ghi; other=1"]);
        assert_eq!(parse_cookie(&h, "session").as_deref(), Some("abc.def.ghi"));
        assert_eq!(parse_cookie(&h, "theme").as_deref(), Some("dark"));
        assert!(parse_cookie(&h, "missing").is_none());
    }

    #[test]
    fn parse_cookie_scans_every_header() {
        let h = headers_with(&["a=1", "session=tok"]);
        assert_eq!(session_token(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn empty_session_cookie_is_no_token() {
        let h = headers_with(&["session="]);
        assert!(session_token(&h).is_none());
    }

    #[test]
    fn cookie_attributes() {
        let dev = CookieSettings { max_age_secs: 604800, secure: false };
        let v = set_session_cookie("tok", dev).unwrap();
        assert_eq!(v.to_str().unwrap(), "session=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800");
        let prod = CookieSettings { max_age_secs: 86400, secure: true };
        let v = set_session_cookie("tok", prod).unwrap();
        assert!(v.to_str().unwrap().ends_with("; Secure"));
        assert!(clear_session_cookie(dev).to_str().unwrap().contains("Max-Age=0"));
    }
}
