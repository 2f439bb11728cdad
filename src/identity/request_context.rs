use super::SessionUser;

/// Identity attached to a single request once the gate has verified its session cookie.
/// Lives in the request extensions; nothing is cached across requests.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: SessionUser,
    pub path: String,
}
