//! Identity: credential store, password checks, session tokens, login and role checks.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod credentials;
pub mod password;
mod session;
mod provider;
mod request_context;
mod authorizer;

pub use principal::{Role, SessionUser};
pub use credentials::{CredentialRecord, CredentialStore};
pub use password::StoredPassword;
pub use session::{SessionClaims, SessionCodec, SessionToken};
pub use provider::{AuthProvider, LocalAuthProvider, LoginRequest, LoginResponse};
pub use request_context::RequestContext;
pub use authorizer::{Action, action_for_method, is_allowed};
