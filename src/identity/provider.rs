use tracing::{info, warn};

use super::credentials::CredentialStore;
use super::password;
use super::principal::SessionUser;
use super::session::{SessionCodec, SessionToken};
use crate::error::AuthError;

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Outcome of a successful login: the public user record plus the token for the cookie.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub user: SessionUser,
    pub token: SessionToken,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError>;
}

/// Logs users in against the configured credential store.
pub struct LocalAuthProvider {
    pub store: CredentialStore,
    pub codec: SessionCodec,
}

impl LocalAuthProvider {
    pub fn new(store: CredentialStore, codec: SessionCodec) -> Self { Self { store, codec } }
}

impl LoginRequest {
    /// Read the fields from an arbitrary JSON body. `None` when either field is missing
    /// or not a string; such a body can never match a stored user.
    pub fn from_json(body: &serde_json::Value) -> Option<Self> {
        let email = body.get("email")?.as_str()?;
        let password = body.get("password")?.as_str()?;
        Some(Self { email: email.to_string(), password: password.to_string() })
    }
}

impl LocalAuthProvider {
    /// Log in from a raw JSON body. Unreadable fields fail exactly like an unknown email.
    pub fn login_json(&self, body: &serde_json::Value) -> Result<LoginResponse, AuthError> {
        match LoginRequest::from_json(body) {
            Some(req) => self.login(&req),
            None => {
                let candidate = body.get("password").and_then(|p| p.as_str()).unwrap_or("");
                Err(self.reject_unknown("<unreadable>", candidate))
            }
        }
    }

    // burn the same verification cost as a real user before failing
    fn reject_unknown(&self, email: &str, candidate: &str) -> AuthError {
        if let Some(dummy) = self.store.dummy_password() {
            let _ = password::verify_phc(dummy.as_phc(), candidate);
        }
        warn!(target: "auth", email = %email, "login rejected");
        AuthError::InvalidCredentials
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> Result<LoginResponse, AuthError> {
        let Some(record) = self.store.find_by_email(&req.email) else {
            return Err(self.reject_unknown(&req.email, &req.password));
        };
        if !password::verify(&req.password, record) {
            warn!(target: "auth", email = %req.email, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }
        let user = record.to_session_user();
        let token = self.codec.sign(&user)?;
        info!(target: "auth", email = %user.email, role = %user.role, "login ok");
        Ok(LoginResponse { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{CredentialRecord, Role, StoredPassword};

    fn provider() -> LocalAuthProvider {
        let store = CredentialStore::from_records(vec![
            CredentialRecord::new("a@x.com", "A", Role::Admin, Some(StoredPassword::from_plaintext("p").unwrap())),
            CredentialRecord::new("v@x.com", "V", Role::ReadOnly, Some(StoredPassword::from_plaintext("q").unwrap())),
            CredentialRecord::new("n@x.com", "N", Role::ReadOnly, None),
        ]);
        LocalAuthProvider::new(store, SessionCodec::from_secret("secret", 7.0).unwrap())
    }

    fn req(email: &str, password: &str) -> LoginRequest {
        LoginRequest { email: email.into(), password: password.into() }
    }

    #[test]
    fn login_issues_verifiable_token() {
        let p = provider();
        for (email, pw, role) in [("a@x.com", "p", Role::Admin), ("v@x.com", "q", Role::ReadOnly)] {
            let resp = p.login(&req(email, pw)).unwrap();
            assert_eq!(resp.user.email, email);
            assert_eq!(resp.user.role, role);
            let decoded = p.codec.verify(resp.token.as_str()).unwrap();
            assert_eq!(decoded, resp.user);
        }
    }

    #[test]
    fn wrong_password_and_unknown_email_look_the_same() {
        let p = provider();
        let wrong = p.login(&req("a@x.com", "wrong")).unwrap_err();
        let unknown = p.login(&req("ghost@x.com", "p")).unwrap_err();
        let no_password = p.login(&req("n@x.com", "")).unwrap_err();
        assert_eq!(wrong, AuthError::InvalidCredentials);
        assert_eq!(unknown, wrong);
        assert_eq!(no_password, wrong);
    }

    #[test]
    fn json_body_with_unreadable_fields_is_rejected_like_unknown_email() {
        let p = provider();
        let ok = p.login_json(&serde_json::json!({ "email": "a@x.com", "password": "p", "extra": 1 })).unwrap();
        assert_eq!(ok.user.email, "a@x.com");
        for body in [
            serde_json::json!({ "email": 5, "password": "p" }),
            serde_json::json!({ "email": "a@x.com", "password": ["p"] }),
            serde_json::json!({ "password": "p" }),
            serde_json::json!(null),
            serde_json::json!("a@x.com"),
        ] {
            assert_eq!(p.login_json(&body).unwrap_err(), AuthError::InvalidCredentials, "{}", body);
        }
    }
}
