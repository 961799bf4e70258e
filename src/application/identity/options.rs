//! Identity policy options
//!
//! Loaded from the `[identity]` section of the config file.

use serde::{Deserialize, Serialize};

use crate::infrastructure::crypto::password::DEFAULT_COST;

pub const DEFAULT_ALLOWED_USER_NAME_CHARACTERS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._@+";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityOptions {
    /// bcrypt work factor (4..=31)
    pub hash_cost: u32,
    pub password: PasswordOptions,
    pub user: UserOptions,
}

impl Default for IdentityOptions {
    fn default() -> Self {
        Self {
            hash_cost: DEFAULT_COST,
            password: PasswordOptions::default(),
            user: UserOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordOptions {
    pub required_length: usize,
    pub required_unique_chars: usize,
    pub require_non_alphanumeric: bool,
    pub require_digit: bool,
    pub require_lowercase: bool,
    pub require_uppercase: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            required_length: 6,
            required_unique_chars: 1,
            require_non_alphanumeric: true,
            require_digit: true,
            require_lowercase: true,
            require_uppercase: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserOptions {
    /// Empty means any character is accepted.
    pub allowed_user_name_characters: String,
    pub require_unique_email: bool,
}

impl Default for UserOptions {
    fn default() -> Self {
        Self {
            allowed_user_name_characters: DEFAULT_ALLOWED_USER_NAME_CHARACTERS.to_string(),
            require_unique_email: true,
        }
    }
}
