use axum::http::Method;

use super::principal::Role;

/// Coarse operations on the registry (people, properties, policies, attachments).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
}

/// Admins may do everything; the read-only role may only view.
pub fn is_allowed(role: Role, action: Action) -> bool {
    match role {
        Role::Admin => true,
        Role::ReadOnly => matches!(action, Action::View),
    }
}

/// Map an HTTP method to the action it performs. Safe methods are views.
pub fn action_for_method(method: &Method) -> Action {
    match *method {
        Method::GET | Method::HEAD | Method::OPTIONS => Action::View,
        Method::POST => Action::Create,
        Method::PUT | Method::PATCH => Action::Update,
        Method::DELETE => Action::Delete,
        // anything exotic is treated as a mutation
        _ => Action::Update,
    }
}
