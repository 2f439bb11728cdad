//! Process configuration resolved once at startup.
//!
//! Values come from environment variables (optionally seeded from a `.env` file by the
//! binaries). Everything is resolved through a lookup function so tests can inject a
//! map instead of touching the real environment.

use std::path::PathBuf;

use tracing::warn;

use crate::error::AuthError;

pub const ENV_JWT_SECRET: &str = "AUTH_JWT_SECRET";
pub const ENV_USERS: &str = "AUTH_USERS";
pub const ENV_SESSION_DAYS: &str = "AUTH_SESSION_DAYS";
pub const ENV_APP_ENV: &str = "APP_ENV";
pub const ENV_NODE_ENV: &str = "NODE_ENV";
pub const ENV_HTTP_PORT: &str = "APOLICES_HTTP_PORT";
pub const ENV_BIND: &str = "APOLICES_BIND";
pub const ENV_STATIC_DIR: &str = "APOLICES_STATIC_DIR";

pub const DEFAULT_SESSION_DAYS: f64 = 7.0;
pub const MAX_SESSION_DAYS: f64 = 3650.0;
pub const DEFAULT_HTTP_PORT: u16 = 3000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_STATIC_DIR: &str = "public";

const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// Authentication settings: signing secret, credential list, session lifetime.
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Raw `AUTH_USERS` value; parsed by the credential store.
    pub users_json: Option<String>,
    /// May be fractional (`0.5` is twelve hours).
    pub session_days: f64,
    /// Enables the `Secure` cookie attribute.
    pub production: bool,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("users_json", &self.users_json.as_ref().map(|_| "<set>"))
            .field("session_days", &self.session_days)
            .field("production", &self.production)
            .finish()
    }
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Resolve from an arbitrary key lookup. Fails only when the signing secret is absent.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, AuthError> {
        let jwt_secret = lookup(ENV_JWT_SECRET)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::MissingConfiguration(format!("{} is not set", ENV_JWT_SECRET)))?;
        let session_days = parse_session_days(lookup(ENV_SESSION_DAYS).as_deref());
        let env_name = lookup(ENV_APP_ENV).or_else(|| lookup(ENV_NODE_ENV));
        let production = env_name.map(|v| v.trim().eq_ignore_ascii_case("production")).unwrap_or(false);
        Ok(Self { jwt_secret, users_json: lookup(ENV_USERS), session_days, production })
    }

    /// Cookie `Max-Age` and token lifetime, in seconds.
    pub fn session_max_age_secs(&self) -> i64 {
        session_secs(self.session_days).unwrap_or(0)
    }
}

/// Whole seconds in a lifetime of `days`; `None` unless at least one second and at most
/// `MAX_SESSION_DAYS`.
pub fn session_secs(days: f64) -> Option<i64> {
    if !days.is_finite() || days <= 0.0 || days > MAX_SESSION_DAYS {
        return None;
    }
    let secs = (days * SECONDS_PER_DAY).floor() as i64;
    (secs >= 1).then_some(secs)
}

fn parse_session_days(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else { return DEFAULT_SESSION_DAYS; };
    match raw.trim().parse::<f64>() {
        Ok(d) if session_secs(d).is_some() => d,
        _ => {
            warn!("{}='{}' is not a number of days in (0, {}]; using {} days", ENV_SESSION_DAYS, raw, MAX_SESSION_DAYS, DEFAULT_SESSION_DAYS);
            DEFAULT_SESSION_DAYS
        }
    }
}

/// Listener settings plus the auth configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub http_port: u16,
    pub static_dir: PathBuf,
    pub auth: AuthConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, AuthError> {
        let auth = AuthConfig::from_lookup(&lookup)?;
        let http_port = lookup(ENV_HTTP_PORT).and_then(|v| v.parse::<u16>().ok()).unwrap_or(DEFAULT_HTTP_PORT);
        let bind = lookup(ENV_BIND).filter(|s| !s.is_empty()).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let static_dir = lookup(ENV_STATIC_DIR).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        Ok(Self { bind, http_port, static_dir, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = AuthConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, AuthError::MissingConfiguration(_)));
        let err = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "")])).unwrap_err();
        assert!(matches!(err, AuthError::MissingConfiguration(_)));
    }

    #[test]
    fn defaults_apply() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "s3cret")])).unwrap();
        assert_eq!(cfg.session_days, 7.0);
        assert_eq!(cfg.session_max_age_secs(), 7 * 86400);
        assert!(!cfg.production);
        assert!(cfg.users_json.is_none());
    }

    #[test]
    fn session_days_and_production_flag() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[
            (ENV_JWT_SECRET, "s3cret"),
            (ENV_SESSION_DAYS, "2"),
            (ENV_NODE_ENV, "production"),
        ]))
        .unwrap();
        assert_eq!(cfg.session_max_age_secs(), 2 * 86400);
        assert!(cfg.production);

        for bad in ["abc", "0", "-3", "99999999", "NaN", "inf", "0.000001"] {
            let cfg = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "s3cret"), (ENV_SESSION_DAYS, bad)])).unwrap();
            assert_eq!(cfg.session_days, DEFAULT_SESSION_DAYS, "{}", bad);
        }
    }

    #[test]
    fn fractional_session_days() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "s3cret"), (ENV_SESSION_DAYS, "0.5")])).unwrap();
        assert_eq!(cfg.session_days, 0.5);
        assert_eq!(cfg.session_max_age_secs(), 43200);
        assert_eq!(session_secs(1.5), Some(129600));
        assert_eq!(session_secs(0.0), None);
    }

    #[test]
    fn debug_output_hides_secret() {
        let cfg = AuthConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "topsecret")])).unwrap();
        assert!(!format!("{:?}", cfg).contains("topsecret"));
    }

    #[test]
    fn server_config_defaults() {
        let cfg = ServerConfig::from_lookup(lookup_from(&[(ENV_JWT_SECRET, "x"), (ENV_HTTP_PORT, "8080")])).unwrap();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.bind, "0.0.0.0");
        assert_eq!(cfg.static_dir, PathBuf::from("public"));
    }
}
