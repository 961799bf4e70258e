//! Password hashing utilities

use bcrypt::hash;

pub use bcrypt::DEFAULT_COST;

/// Hash a password using bcrypt with the given work factor
pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}
