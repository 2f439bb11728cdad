//! Unified application error model and mapping helpers.
//! `AuthError` is the typed taxonomy produced by the identity layer; `AppError` is what
//! the HTTP surface renders. Auth failures never cross the request boundary as panics or
//! 500s: they are mapped to one of the fixed response shapes here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Fixed message for both "unknown email" and "wrong password".
pub const INVALID_CREDENTIALS_MSG: &str = "Credenciais inválidas";
pub const FORBIDDEN_MSG: &str = "Acesso negado";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("session token expired")]
    Expired,
    #[error("malformed session token")]
    MalformedToken,
    #[error("missing configuration: {0}")]
    MissingConfiguration(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    /// Token failures that the gate and who-am-i treat as "not authenticated".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthError::InvalidSignature | AuthError::Expired | AuthError::MalformedToken)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    Auth { code: String, message: String },
    Forbidden { code: String, message: String },
    Config { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::Config { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::Config { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::Auth { .. } => 401,
            AppError::Forbidden { .. } => 403,
            AppError::Config { .. } => 500,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            // unknown email and wrong password share one message
            AuthError::InvalidCredentials => AppError::auth("invalid_credentials", INVALID_CREDENTIALS_MSG),
            AuthError::InvalidSignature | AuthError::Expired | AuthError::MalformedToken => {
                AppError::auth("unauthenticated", "Sessão inválida")
            }
            AuthError::MissingConfiguration(what) => AppError::Config { code: "missing_configuration".into(), message: what },
            AuthError::Hashing(_) | AuthError::Signing(_) => AppError::internal("internal", "internal server error"),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(serde_json::json!({ "ok": false, "error": self.message() }))).into_response()
    }
}
