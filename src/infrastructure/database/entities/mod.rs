//! Database entities module
//!
//! Identity tables. Only `user` is read or written by the application;
//! the rest are mapped so the schema and cascades stay complete.

pub mod role;
pub mod role_claim;
pub mod user;
pub mod user_claim;
pub mod user_login;
pub mod user_role;
pub mod user_token;

pub use role::Entity as Role;
pub use role_claim::Entity as RoleClaim;
pub use user::Entity as User;
pub use user_claim::Entity as UserClaim;
pub use user_login::Entity as UserLogin;
pub use user_role::Entity as UserRole;
pub use user_token::Entity as UserToken;
