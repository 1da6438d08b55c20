pub mod books;
pub mod users;

use bookstore_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register all feature modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register(users::create_module(state.users.clone()));
    registry.register(books::create_module(state.books.clone()));
}
