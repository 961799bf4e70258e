//! User aggregate
//!
//! Contains the User entity, identity results, the persistence
//! interface and the account store capability used by the HTTP layer.

pub mod identity_result;
pub mod model;
pub mod repository;
pub mod store;

pub use identity_result::{IdentityError, IdentityResult};
pub use model::User;
pub use repository::UserRepositoryInterface;
pub use store::AccountStore;
