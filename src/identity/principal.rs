use serde::{Deserialize, Serialize};

/// The two roles a user can hold. `visualizacao` is the read-only role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "visualizacao", alias = "read-only", alias = "readonly")]
    ReadOnly,
}

impl Role {
    pub fn is_admin(&self) -> bool { matches!(self, Role::Admin) }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::ReadOnly => "visualizacao",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-secret identity claims: what a session token carries and what the API returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}
