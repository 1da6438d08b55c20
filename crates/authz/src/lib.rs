//! Role-based authorization policy.
//!
//! Every catalog mutation requires the admin role; reads are open. The policy
//! is a pure function of `(role, action)` so it can be checked before any
//! store access happens.

use std::fmt;

use bookstore_auth::Role;
use thiserror::Error;

/// Catalog mutations subject to the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateBook,
    UpdateBook,
    DeleteBook,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::CreateBook => "create book",
            Action::UpdateBook => "update book",
            Action::DeleteBook => "delete book",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("action '{action}' requires the admin role")]
pub struct Denied {
    pub action: Action,
}

/// Allow or deny an action for the given role.
pub fn authorize(role: Role, action: Action) -> Result<(), Denied> {
    match role {
        Role::Admin => Ok(()),
        Role::User => {
            tracing::debug!(%action, role = role.as_str(), "authorization denied");
            Err(Denied { action })
        }
    }
}
