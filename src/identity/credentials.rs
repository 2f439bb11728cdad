//! Read-only table of valid logins, built once from the `AUTH_USERS` configuration value.
//!
//! Parsing fails soft: an absent, malformed or non-array value yields an empty store and
//! every lookup then reports "no user found". Individual entries that do not parse are
//! skipped with a warning.

use serde::Deserialize;
use tracing::warn;

use super::password::StoredPassword;
use super::principal::{Role, SessionUser};

#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub email: String,
    pub name: String,
    pub role: Role,
    password: Option<StoredPassword>,
}

impl CredentialRecord {
    pub fn new(email: impl Into<String>, name: impl Into<String>, role: Role, password: Option<StoredPassword>) -> Self {
        Self { email: email.into(), name: name.into(), role, password }
    }

    pub fn password(&self) -> Option<&StoredPassword> { self.password.as_ref() }

    /// The non-secret subset placed in tokens and response bodies.
    pub fn to_session_user(&self) -> SessionUser {
        SessionUser { email: self.email.clone(), name: self.name.clone(), role: self.role }
    }
}

// Wire shape of one AUTH_USERS entry.
#[derive(Debug, Deserialize)]
struct RawRecord {
    email: String,
    name: String,
    role: Role,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    users: Vec<CredentialRecord>,
    // Verified against when the email is unknown so both failure paths do the same work.
    dummy: Option<StoredPassword>,
}

impl CredentialStore {
    pub fn from_records(users: Vec<CredentialRecord>) -> Self {
        let dummy = StoredPassword::from_plaintext("\u{0}unknown-user\u{0}").ok();
        Self { users, dummy }
    }

    pub fn empty() -> Self { Self::from_records(Vec::new()) }

    /// Build from the raw configuration value. Never fails.
    pub fn from_json(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return Self::empty(); };
        let parsed: serde_json::Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                warn!("AUTH_USERS is not valid JSON: {}", e);
                return Self::empty();
            }
        };
        let serde_json::Value::Array(items) = parsed else {
            warn!("AUTH_USERS is not a JSON array; no users loaded");
            return Self::empty();
        };
        let mut users = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            let raw: RawRecord = match serde_json::from_value(item) {
                Ok(r) => r,
                Err(e) => {
                    warn!("AUTH_USERS[{}] skipped: {}", idx, e);
                    continue;
                }
            };
            users.push(record_from_raw(idx, raw));
        }
        Self::from_records(users)
    }

    pub fn list_users(&self) -> &[CredentialRecord] { &self.users }

    /// First record whose email matches exactly (case-sensitive).
    pub fn find_by_email(&self, email: &str) -> Option<&CredentialRecord> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn len(&self) -> usize { self.users.len() }

    pub fn is_empty(&self) -> bool { self.users.is_empty() }

    pub(crate) fn dummy_password(&self) -> Option<&StoredPassword> { self.dummy.as_ref() }
}

fn record_from_raw(idx: usize, raw: RawRecord) -> CredentialRecord {
    let from_hash = raw.password_hash.as_deref().and_then(|phc| match StoredPassword::from_phc(phc) {
        Ok(p) => Some(p),
        Err(e) => {
            warn!("AUTH_USERS[{}] password_hash ignored: {}", idx, e);
            None
        }
    });
    let password = from_hash.or_else(|| {
        raw.password.as_deref().filter(|p| !p.is_empty()).and_then(|plain| match StoredPassword::from_plaintext(plain) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("AUTH_USERS[{}] password could not be hashed: {}", idx, e);
                None
            }
        })
    });
    CredentialRecord::new(raw.email, raw.name, raw.role, password)
}
