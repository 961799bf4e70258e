use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr,
};

use crate::domain::{DomainError, DomainResult, User, UserRepositoryInterface};
use crate::infrastructure::database::entities::user;

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        user_name: model.user_name,
        normalized_user_name: model.normalized_user_name,
        email: model.email,
        normalized_email: model.normalized_email,
        email_confirmed: model.email_confirmed,
        password_hash: model.password_hash,
        security_stamp: model.security_stamp,
        concurrency_stamp: model.concurrency_stamp,
        phone_number: model.phone_number,
        phone_number_confirmed: model.phone_number_confirmed,
        two_factor_enabled: model.two_factor_enabled,
        lockout_end: model.lockout_end,
        lockout_enabled: model.lockout_enabled,
        access_failed_count: model.access_failed_count,
    }
}

fn domain_to_active_model(u: &User) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(u.id.clone()),
        user_name: Set(u.user_name.clone()),
        normalized_user_name: Set(u.normalized_user_name.clone()),
        email: Set(u.email.clone()),
        normalized_email: Set(u.normalized_email.clone()),
        email_confirmed: Set(u.email_confirmed),
        password_hash: Set(u.password_hash.clone()),
        security_stamp: Set(u.security_stamp.clone()),
        concurrency_stamp: Set(u.concurrency_stamp.clone()),
        phone_number: Set(u.phone_number.clone()),
        phone_number_confirmed: Set(u.phone_number_confirmed),
        two_factor_enabled: Set(u.two_factor_enabled),
        lockout_end: Set(u.lockout_end),
        lockout_enabled: Set(u.lockout_enabled),
        access_failed_count: Set(u.access_failed_count),
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Storage(e.to_string())
}

fn write_err(e: DbErr) -> DomainError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => DomainError::Conflict(detail),
        _ => db_err(e),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let models = user::Entity::find()
            .order_by_asc(user::Column::NormalizedUserName)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(models.into_iter().map(user_model_to_domain).collect())
    }

    async fn get_user_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_normalized_user_name(
        &self,
        normalized: &str,
    ) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::NormalizedUserName.eq(normalized))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_normalized_email(&self, normalized: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::NormalizedEmail.eq(normalized))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn create_user(&self, user: &User) -> DomainResult<()> {
        domain_to_active_model(user)
            .insert(&self.db)
            .await
            .map_err(write_err)?;

        Ok(())
    }

    async fn update_user(&self, user: &User, expected_stamp: &str) -> DomainResult<bool> {
        let result = user::Entity::update_many()
            .set(domain_to_active_model(user))
            .filter(user::Column::Id.eq(user.id.as_str()))
            .filter(user::Column::ConcurrencyStamp.eq(expected_stamp))
            .exec(&self.db)
            .await
            .map_err(write_err)?;

        Ok(result.rows_affected > 0)
    }

    async fn delete_user(&self, id: &str, expected_stamp: &str) -> DomainResult<bool> {
        let result = user::Entity::delete_many()
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::ConcurrencyStamp.eq(expected_stamp))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ModelTrait, PaginatorTrait};

    use super::*;
    use crate::infrastructure::database::entities::{role, user_claim, user_role};
    use crate::infrastructure::database::testing::migrated_db;

    fn sample_user(name: &str) -> User {
        let mut u = User::new(name);
        u.normalized_user_name = name.to_uppercase();
        u.email = Some(format!("{}@example.com", name));
        u.normalized_email = Some(format!("{}@EXAMPLE.COM", name.to_uppercase()));
        u.security_stamp = "STAMP".to_string();
        u
    }

    #[tokio::test]
    async fn create_then_lookup_by_every_key() {
        let (_dir, db) = migrated_db().await;
        let repo = UserRepository::new(db);
        let alice = sample_user("alice");
        repo.create_user(&alice).await.unwrap();

        assert_eq!(repo.get_user_by_id(&alice.id).await.unwrap(), Some(alice.clone()));
        assert_eq!(
            repo.get_user_by_normalized_user_name("ALICE").await.unwrap(),
            Some(alice.clone())
        );
        assert_eq!(
            repo.get_user_by_normalized_email("ALICE@EXAMPLE.COM")
                .await
                .unwrap()
                .map(|u| u.id),
            Some(alice.id)
        );
        assert!(repo.get_user_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_normalized_user_name_is_a_conflict() {
        let (_dir, db) = migrated_db().await;
        let repo = UserRepository::new(db);
        repo.create_user(&sample_user("bob")).await.unwrap();

        let err = repo.create_user(&sample_user("bob")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_is_ordered_by_normalized_user_name() {
        let (_dir, db) = migrated_db().await;
        let repo = UserRepository::new(db);
        for name in ["carol", "alice", "bob"] {
            repo.create_user(&sample_user(name)).await.unwrap();
        }

        let names: Vec<_> = repo
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_name)
            .collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn stale_stamp_matches_no_row() {
        let (_dir, db) = migrated_db().await;
        let repo = UserRepository::new(db);
        let mut dave = sample_user("dave");
        repo.create_user(&dave).await.unwrap();

        let loaded_stamp = dave.concurrency_stamp.clone();
        dave.phone_number = Some("555-0100".to_string());
        dave.concurrency_stamp = "NEXT".to_string();

        assert!(!repo.update_user(&dave, "OTHER").await.unwrap());
        assert!(repo.update_user(&dave, &loaded_stamp).await.unwrap());

        let stored = repo.get_user_by_id(&dave.id).await.unwrap().unwrap();
        assert_eq!(stored.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(stored.concurrency_stamp, "NEXT");

        assert!(!repo.delete_user(&dave.id, &loaded_stamp).await.unwrap());
        assert!(repo.delete_user(&dave.id, "NEXT").await.unwrap());
        assert!(repo.get_user_by_id(&dave.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_user_cascades_to_dependent_rows() {
        let (_dir, db) = migrated_db().await;
        let repo = UserRepository::new(db.clone());
        let erin = sample_user("erin");
        repo.create_user(&erin).await.unwrap();

        role::ActiveModel {
            id: Set("role-1".to_string()),
            name: Set(Some("Admin".to_string())),
            normalized_name: Set(Some("ADMIN".to_string())),
            concurrency_stamp: Set(None),
        }
        .insert(&db)
        .await
        .unwrap();
        user_role::Entity::insert(user_role::ActiveModel {
            user_id: Set(erin.id.clone()),
            role_id: Set("role-1".to_string()),
        })
        .exec_without_returning(&db)
        .await
        .unwrap();
        user_claim::Entity::insert(user_claim::ActiveModel {
            user_id: Set(erin.id.clone()),
            claim_type: Set(Some("department".to_string())),
            claim_value: Set(Some("ops".to_string())),
            ..Default::default()
        })
        .exec_without_returning(&db)
        .await
        .unwrap();

        let model = user::Entity::find_by_id(erin.id.as_str())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let roles = model.find_related(role::Entity).all(&db).await.unwrap();
        assert_eq!(roles.len(), 1);

        assert!(repo
            .delete_user(&erin.id, &erin.concurrency_stamp)
            .await
            .unwrap());

        assert_eq!(user_role::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(user_claim::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(role::Entity::find().count(&db).await.unwrap(), 1);
    }
}
