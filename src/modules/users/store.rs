use std::sync::Arc;

use bookstore_db::{Collection, DbError};

use super::models::User;

/// Credential store: user records with a unique index on email.
///
/// Email matching is exact; the unique index is the authoritative guard
/// against two concurrent registrations racing past the handler's advisory
/// existence check.
#[derive(Clone)]
pub struct UserStore {
    users: Arc<Collection<User>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: Collection::new()
                .with_unique_index("user_email", |user: &User| user.email.clone())
                .into_shared(),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.find_one(|user| user.email == email).await
    }

    pub async fn insert(&self, user: User) -> Result<User, DbError> {
        self.users.insert(user).await
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
