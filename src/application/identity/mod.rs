//! Identity module: account management
//!
//! Contains the `UserManager` which implements the account store:
//! validation, password hashing and optimistic concurrency.

pub mod manager;
pub mod options;
pub mod validators;

pub use manager::UserManager;
pub use options::{IdentityOptions, PasswordOptions, UserOptions};
pub use validators::normalize;
