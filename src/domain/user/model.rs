use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity record
///
/// `id` is assigned once in [`User::new`] and never changes afterwards.
/// The normalized columns and stamps are maintained by the account store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub user_name: String,
    pub normalized_user_name: String,
    pub email: Option<String>,
    pub normalized_email: Option<String>,
    pub email_confirmed: bool,
    pub password_hash: Option<String>,
    pub security_stamp: String,
    pub concurrency_stamp: String,
    pub phone_number: Option<String>,
    pub phone_number_confirmed: bool,
    pub two_factor_enabled: bool,
    pub lockout_end: Option<DateTime<Utc>>,
    pub lockout_enabled: bool,
    pub access_failed_count: i32,
}

impl User {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_name: user_name.into(),
            normalized_user_name: String::new(),
            email: None,
            normalized_email: None,
            email_confirmed: false,
            password_hash: None,
            security_stamp: String::new(),
            concurrency_stamp: new_stamp(),
            phone_number: None,
            phone_number_confirmed: false,
            two_factor_enabled: false,
            lockout_end: None,
            lockout_enabled: true,
            access_failed_count: 0,
        }
    }
}

/// Random opaque token used for security and concurrency stamps.
pub fn new_stamp() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_has_fresh_identity() {
        let a = User::new("alice");
        let b = User::new("alice");

        assert_ne!(a.id, b.id);
        assert_ne!(a.concurrency_stamp, b.concurrency_stamp);
        assert!(a.lockout_enabled);
        assert!(a.password_hash.is_none());
    }
}
