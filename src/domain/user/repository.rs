use async_trait::async_trait;

use super::User;
use crate::domain::DomainResult;

/// Raw persistence for identity records. No validation happens here.
#[async_trait]
pub trait UserRepositoryInterface: Send + Sync {
    /// All users ordered by normalized user name.
    async fn list_users(&self) -> DomainResult<Vec<User>>;
    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn get_user_by_normalized_user_name(&self, normalized: &str)
        -> DomainResult<Option<User>>;
    async fn get_user_by_normalized_email(&self, normalized: &str) -> DomainResult<Option<User>>;

    /// Fails with [`DomainError::Conflict`](crate::domain::DomainError::Conflict)
    /// when a unique index rejects the row.
    async fn create_user(&self, user: &User) -> DomainResult<()>;

    /// Writes every column of `user` if the stored concurrency stamp still
    /// equals `expected_stamp`. Returns `false` when no row matched.
    async fn update_user(&self, user: &User, expected_stamp: &str) -> DomainResult<bool>;

    /// Same matching rule as [`update_user`](Self::update_user).
    async fn delete_user(&self, id: &str, expected_stamp: &str) -> DomainResult<bool>;
}
