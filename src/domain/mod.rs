pub mod error;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use user::{AccountStore, IdentityError, IdentityResult, User, UserRepositoryInterface};
