use std::sync::Arc;

use bookstore_auth::{PasswordHasher, TokenService};
use bookstore_kernel::Settings;

use crate::modules::books::{store::BookCatalog, BooksState};
use crate::modules::users::{store::UserStore, UsersState};

/// Shared application state: one store and one token service per process.
pub struct AppState {
    pub users: UsersState,
    pub books: BooksState,
}

impl AppState {
    pub fn from_settings(settings: &Settings) -> Self {
        let tokens = Arc::new(TokenService::new(&settings.auth.jwt_secret));

        Self {
            users: UsersState {
                store: UserStore::new(),
                tokens: tokens.clone(),
                hasher: PasswordHasher::default(),
                admin_signup_key: settings.auth.admin_signup_key.clone(),
            },
            books: BooksState {
                catalog: BookCatalog::new(),
                tokens,
            },
        }
    }
}
