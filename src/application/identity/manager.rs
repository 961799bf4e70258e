//! User manager: the account store used by the HTTP layer
//!
//! Normalizes lookup keys, runs the validators, hashes passwords and
//! maintains security/concurrency stamps on top of a
//! [`UserRepositoryInterface`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::options::IdentityOptions;
use super::validators::{normalize, validate_password, validate_user};
use crate::domain::user::model::new_stamp;
use crate::domain::{
    AccountStore, DomainError, DomainResult, IdentityError, IdentityResult, User,
    UserRepositoryInterface,
};
use crate::infrastructure::crypto::password::hash_password;

/// `create` and `update` hold `write_lock` from uniqueness validation until
/// the row is written. The email index is not unique, so this lock is what
/// keeps two users from claiming the same address.
pub struct UserManager<R: UserRepositoryInterface> {
    repo: Arc<R>,
    options: IdentityOptions,
    write_lock: Mutex<()>,
}

impl<R: UserRepositoryInterface> UserManager<R> {
    pub fn new(repo: Arc<R>, options: IdentityOptions) -> Self {
        Self {
            repo,
            options,
            write_lock: Mutex::new(()),
        }
    }

    fn update_normalized_fields(user: &mut User) {
        user.normalized_user_name = normalize(&user.user_name);
        user.normalized_email = user.email.as_deref().map(normalize);
    }

    async fn validate(&self, user: &User) -> DomainResult<Vec<IdentityError>> {
        validate_user(self.repo.as_ref(), &self.options.user, user).await
    }

    /// bcrypt is CPU bound; keep it off the async workers.
    async fn hash(&self, password: &str) -> DomainResult<String> {
        let password = password.to_owned();
        let cost = self.options.hash_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| DomainError::Crypto(format!("Hashing task failed: {}", e)))?
            .map_err(|e| DomainError::Crypto(format!("Failed to hash password: {}", e)))
    }
}

#[async_trait]
impl<R: UserRepositoryInterface> AccountStore for UserManager<R> {
    async fn users(&self) -> DomainResult<Vec<User>> {
        self.repo.list_users().await
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        self.repo.get_user_by_id(id).await
    }

    async fn create(&self, user: &mut User, password: &str) -> DomainResult<IdentityResult> {
        Self::update_normalized_fields(user);

        let password_errors = validate_password(&self.options.password, password);
        let hash = if password_errors.is_empty() {
            Some(self.hash(password).await?)
        } else {
            None
        };

        let _guard = self.write_lock.lock().await;

        let mut errors = self.validate(user).await?;
        errors.extend(password_errors);
        let hash = match hash {
            Some(hash) if errors.is_empty() => hash,
            _ => {
                let result = IdentityResult::failed(errors);
                warn!(user_name = %user.user_name, %result, "User creation rejected");
                return Ok(result);
            }
        };

        user.password_hash = Some(hash);
        user.security_stamp = new_stamp();
        user.concurrency_stamp = new_stamp();

        match self.repo.create_user(user).await {
            Ok(()) => {
                info!(user_id = %user.id, user_name = %user.user_name, "User created");
                Ok(IdentityResult::success())
            }
            // Lost a race against an insert from another process.
            Err(DomainError::Conflict(detail)) => {
                debug!(%detail, "Unique index rejected new user");
                Ok(IdentityResult::failed(vec![
                    IdentityError::duplicate_user_name(&user.user_name),
                ]))
            }
            Err(e) => Err(e),
        }
    }

    async fn update(&self, user: &mut User) -> DomainResult<IdentityResult> {
        Self::update_normalized_fields(user);

        let _guard = self.write_lock.lock().await;

        let errors = self.validate(user).await?;
        if !errors.is_empty() {
            let result = IdentityResult::failed(errors);
            warn!(user_id = %user.id, %result, "User update rejected");
            return Ok(result);
        }

        let expected = std::mem::replace(&mut user.concurrency_stamp, new_stamp());
        let written = match self.repo.update_user(user, &expected).await {
            Ok(written) => written,
            Err(DomainError::Conflict(detail)) => {
                debug!(%detail, "Unique index rejected user update");
                user.concurrency_stamp = expected;
                return Ok(IdentityResult::failed(vec![
                    IdentityError::duplicate_user_name(&user.user_name),
                ]));
            }
            Err(e) => {
                user.concurrency_stamp = expected;
                return Err(e);
            }
        };

        if !written {
            user.concurrency_stamp = expected;
            warn!(user_id = %user.id, "Concurrency stamp mismatch on update");
            return Ok(IdentityResult::failed(vec![
                IdentityError::concurrency_failure(),
            ]));
        }

        info!(user_id = %user.id, "User updated");
        Ok(IdentityResult::success())
    }

    async fn delete(&self, user: &User) -> DomainResult<IdentityResult> {
        if !self
            .repo
            .delete_user(&user.id, &user.concurrency_stamp)
            .await?
        {
            warn!(user_id = %user.id, "Concurrency stamp mismatch on delete");
            return Ok(IdentityResult::failed(vec![
                IdentityError::concurrency_failure(),
            ]));
        }

        info!(user_id = %user.id, "User deleted");
        Ok(IdentityResult::success())
    }

    async fn set_email(
        &self,
        user: &mut User,
        email: Option<String>,
    ) -> DomainResult<IdentityResult> {
        let changed = email.as_deref().map(normalize) != user.normalized_email;

        user.email = email;
        Self::update_normalized_fields(user);
        if changed {
            user.email_confirmed = false;
            user.security_stamp = new_stamp();
        }

        Ok(IdentityResult::from_errors(self.validate(user).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::identity::options::PasswordOptions;
    use crate::infrastructure::database::repositories::UserRepository;
    use crate::infrastructure::database::testing::migrated_db;

    const PASSWORD: &str = "Passw0rd!";

    fn test_options() -> IdentityOptions {
        IdentityOptions {
            hash_cost: 4,
            ..IdentityOptions::default()
        }
    }

    async fn manager() -> (tempfile::TempDir, UserManager<UserRepository>) {
        let (dir, db) = migrated_db().await;
        let repo = Arc::new(UserRepository::new(db));
        (dir, UserManager::new(repo, test_options()))
    }

    fn new_user(name: &str, email: &str) -> User {
        let mut user = User::new(name);
        user.email = Some(email.to_string());
        user
    }

    fn codes(result: &IdentityResult) -> Vec<&'static str> {
        result.errors().iter().map(|e| e.code).collect()
    }

    #[tokio::test]
    async fn create_hashes_password_and_normalizes() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("alice", "Alice@Example.com");

        let result = manager.create(&mut user, PASSWORD).await.unwrap();
        assert!(result.succeeded());

        let stored = manager.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.normalized_user_name, "ALICE");
        assert_eq!(stored.normalized_email.as_deref(), Some("ALICE@EXAMPLE.COM"));
        assert!(!stored.security_stamp.is_empty());

        let hash = stored.password_hash.unwrap();
        assert_ne!(hash, PASSWORD);
        assert!(bcrypt::verify(PASSWORD, &hash).unwrap());
    }

    #[tokio::test]
    async fn create_accumulates_user_and_password_errors() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("bad name", "not-an-email");

        let result = manager.create(&mut user, "short").await.unwrap();
        assert_eq!(
            codes(&result),
            [
                "InvalidUserName",
                "InvalidEmail",
                "PasswordTooShort",
                "PasswordRequiresNonAlphanumeric",
                "PasswordRequiresDigit",
                "PasswordRequiresUpper",
            ]
        );
        assert!(manager.users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicates_are_detected_case_insensitively() {
        let (_dir, manager) = manager().await;
        let mut first = new_user("carol", "carol@example.com");
        assert!(manager.create(&mut first, PASSWORD).await.unwrap().succeeded());

        let mut second = new_user("CAROL", "Carol@Example.COM");
        let result = manager.create(&mut second, PASSWORD).await.unwrap();
        assert_eq!(codes(&result), ["DuplicateUserName", "DuplicateEmail"]);
        assert_eq!(
            result.errors()[1].description,
            "Email 'Carol@Example.COM' is already taken."
        );
    }

    #[tokio::test]
    async fn email_uniqueness_can_be_disabled() {
        let (_dir, db) = migrated_db().await;
        let mut options = test_options();
        options.user.require_unique_email = false;
        options.password = PasswordOptions {
            required_length: 1,
            required_unique_chars: 0,
            require_non_alphanumeric: false,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
        };
        let manager = UserManager::new(Arc::new(UserRepository::new(db)), options);

        let mut a = new_user("a", "shared@example.com");
        let mut b = new_user("b", "shared@example.com");
        assert!(manager.create(&mut a, "x").await.unwrap().succeeded());
        assert!(manager.create(&mut b, "x").await.unwrap().succeeded());
    }

    #[tokio::test]
    async fn set_email_is_not_persisted_until_update() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("dave", "dave@example.com");
        manager.create(&mut user, PASSWORD).await.unwrap();
        user.email_confirmed = true;

        let result = manager
            .set_email(&mut user, Some("dave@new.example.com".to_string()))
            .await
            .unwrap();
        assert!(result.succeeded());
        assert!(!user.email_confirmed);

        let stored = manager.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("dave@example.com"));

        assert!(manager.update(&mut user).await.unwrap().succeeded());
        let stored = manager.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("dave@new.example.com"));
        assert_eq!(stored.normalized_email.as_deref(), Some("DAVE@NEW.EXAMPLE.COM"));
    }

    #[tokio::test]
    async fn set_email_to_same_address_keeps_stamp() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("erin", "erin@example.com");
        manager.create(&mut user, PASSWORD).await.unwrap();
        let stamp = user.security_stamp.clone();

        let result = manager
            .set_email(&mut user, Some("ERIN@example.com".to_string()))
            .await
            .unwrap();
        assert!(result.succeeded());
        assert_eq!(user.security_stamp, stamp);
    }

    #[tokio::test]
    async fn set_email_rejects_address_owned_by_someone_else() {
        let (_dir, manager) = manager().await;
        let mut frank = new_user("frank", "frank@example.com");
        let mut gina = new_user("gina", "gina@example.com");
        manager.create(&mut frank, PASSWORD).await.unwrap();
        manager.create(&mut gina, PASSWORD).await.unwrap();

        let result = manager
            .set_email(&mut gina, Some("frank@example.com".to_string()))
            .await
            .unwrap();
        assert_eq!(codes(&result), ["DuplicateEmail"]);
    }

    #[tokio::test]
    async fn stale_copy_fails_with_concurrency_failure() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("hank", "hank@example.com");
        manager.create(&mut user, PASSWORD).await.unwrap();

        let mut first = manager.find_by_id(&user.id).await.unwrap().unwrap();
        let mut stale = first.clone();

        first.phone_number = Some("555-0101".to_string());
        assert!(manager.update(&mut first).await.unwrap().succeeded());

        stale.phone_number = Some("555-0199".to_string());
        let result = manager.update(&mut stale).await.unwrap();
        assert_eq!(codes(&result), ["ConcurrencyFailure"]);

        let result = manager.delete(&stale).await.unwrap();
        assert_eq!(codes(&result), ["ConcurrencyFailure"]);

        assert!(manager.delete(&first).await.unwrap().succeeded());
        assert!(manager.find_by_id(&user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_keeps_own_name_and_email() {
        let (_dir, manager) = manager().await;
        let mut user = new_user("ivy", "ivy@example.com");
        manager.create(&mut user, PASSWORD).await.unwrap();

        user.phone_number = Some("555-0102".to_string());
        let result = manager.update(&mut user).await.unwrap();
        assert!(result.succeeded(), "{}", result);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_with_same_email_store_one_user() {
        let (_dir, manager) = manager().await;
        let manager = Arc::new(manager);

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    let mut user = new_user(&format!("racer{}", i), "same@example.com");
                    manager.create(&mut user, PASSWORD).await.unwrap()
                })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            let result = task.await.unwrap();
            if result.succeeded() {
                succeeded += 1;
            } else {
                assert_eq!(codes(&result), ["DuplicateEmail"]);
            }
        }
        assert_eq!(succeeded, 1);

        let stored = manager.users().await.unwrap();
        let same: Vec<_> = stored
            .iter()
            .filter(|u| u.normalized_email.as_deref() == Some("SAME@EXAMPLE.COM"))
            .collect();
        assert_eq!(same.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_to_same_email_persist_one() {
        let (_dir, manager) = manager().await;
        let manager = Arc::new(manager);

        let mut users = Vec::new();
        for i in 0..6 {
            let mut user = new_user(&format!("mover{}", i), &format!("mover{}@example.com", i));
            manager.create(&mut user, PASSWORD).await.unwrap();
            users.push(user);
        }

        let tasks: Vec<_> = users
            .into_iter()
            .map(|mut user| {
                let manager = manager.clone();
                tokio::spawn(async move {
                    manager
                        .set_email(&mut user, Some("target@example.com".to_string()))
                        .await
                        .unwrap();
                    manager.update(&mut user).await.unwrap()
                })
            })
            .collect();

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap().succeeded() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);

        let stored = manager.users().await.unwrap();
        let owners = stored
            .iter()
            .filter(|u| u.normalized_email.as_deref() == Some("TARGET@EXAMPLE.COM"))
            .count();
        assert_eq!(owners, 1);
    }
}
