//! Credential primitives for the BookStore API: the role model, bcrypt
//! password hashing, and signed bearer tokens.

pub mod password;
pub mod role;
pub mod token;

pub use password::PasswordHasher;
pub use role::Role;
pub use token::{AuthUser, Claims, TokenError, TokenService};
