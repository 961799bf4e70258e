use async_trait::async_trait;

use super::{IdentityResult, User};
use crate::domain::DomainResult;

/// Account management capability consumed by the HTTP layer.
///
/// Mutating operations report expected failures through [`IdentityResult`];
/// `Err` is reserved for infrastructure failures.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn users(&self) -> DomainResult<Vec<User>>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;

    /// Validates `user` and `password`, hashes the password and inserts the
    /// record. Fills in the hash, stamps and normalized fields of `user`.
    async fn create(&self, user: &mut User, password: &str) -> DomainResult<IdentityResult>;

    /// Validates and persists every field of `user` in a single write.
    async fn update(&self, user: &mut User) -> DomainResult<IdentityResult>;

    async fn delete(&self, user: &User) -> DomainResult<IdentityResult>;

    /// Assigns and validates a new email on the in-memory record only.
    /// The change is persisted by the next [`update`](Self::update).
    async fn set_email(&self, user: &mut User, email: Option<String>)
        -> DomainResult<IdentityResult>;
}
