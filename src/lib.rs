//! BookStore Application Library
//!
//! Feature modules (users, books) and the shared application state wiring
//! them to the kernel and HTTP facade.

pub mod modules;
pub mod state;

pub use state::AppState;
