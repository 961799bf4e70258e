pub mod identity;

pub use identity::{IdentityOptions, UserManager};
