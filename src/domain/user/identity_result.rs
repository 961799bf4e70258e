//! Outcome of a mutating account store operation

use std::fmt;

/// One human-readable reason an identity operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityError {
    pub code: &'static str,
    pub description: String,
}

impl IdentityError {
    pub fn new(code: &'static str, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    pub fn invalid_user_name(user_name: &str) -> Self {
        Self::new(
            "InvalidUserName",
            format!(
                "Username '{}' is invalid, can only contain letters or digits.",
                user_name
            ),
        )
    }

    pub fn duplicate_user_name(user_name: &str) -> Self {
        Self::new(
            "DuplicateUserName",
            format!("Username '{}' is already taken.", user_name),
        )
    }

    pub fn invalid_email(email: &str) -> Self {
        Self::new("InvalidEmail", format!("Email '{}' is invalid.", email))
    }

    pub fn duplicate_email(email: &str) -> Self {
        Self::new(
            "DuplicateEmail",
            format!("Email '{}' is already taken.", email),
        )
    }

    pub fn password_too_short(length: usize) -> Self {
        Self::new(
            "PasswordTooShort",
            format!("Passwords must be at least {} characters.", length),
        )
    }

    pub fn password_requires_unique_chars(unique_chars: usize) -> Self {
        Self::new(
            "PasswordRequiresUniqueChars",
            format!(
                "Passwords must use at least {} different characters.",
                unique_chars
            ),
        )
    }

    pub fn password_requires_non_alphanumeric() -> Self {
        Self::new(
            "PasswordRequiresNonAlphanumeric",
            "Passwords must have at least one non alphanumeric character.",
        )
    }

    pub fn password_requires_digit() -> Self {
        Self::new(
            "PasswordRequiresDigit",
            "Passwords must have at least one digit ('0'-'9').",
        )
    }

    pub fn password_requires_lower() -> Self {
        Self::new(
            "PasswordRequiresLower",
            "Passwords must have at least one lowercase ('a'-'z').",
        )
    }

    pub fn password_requires_upper() -> Self {
        Self::new(
            "PasswordRequiresUpper",
            "Passwords must have at least one uppercase ('A'-'Z').",
        )
    }

    pub fn concurrency_failure() -> Self {
        Self::new(
            "ConcurrencyFailure",
            "Optimistic concurrency failure, object has been modified.",
        )
    }
}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

/// Success flag plus the ordered list of failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResult {
    succeeded: bool,
    errors: Vec<IdentityError>,
}

impl IdentityResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<IdentityError>) -> Self {
        Self {
            succeeded: false,
            errors,
        }
    }

    /// Succeeds only when `errors` is empty.
    pub fn from_errors(errors: Vec<IdentityError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failed(errors)
        }
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn errors(&self) -> &[IdentityError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<IdentityError> {
        self.errors
    }
}

impl fmt::Display for IdentityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.succeeded {
            return write!(f, "Succeeded");
        }
        let codes: Vec<&str> = self.errors.iter().map(|e| e.code).collect();
        write!(f, "Failed: {}", codes.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_error_list_is_success() {
        assert!(IdentityResult::from_errors(Vec::new()).succeeded());
    }

    #[test]
    fn failure_keeps_error_order() {
        let result = IdentityResult::from_errors(vec![
            IdentityError::duplicate_user_name("bob"),
            IdentityError::duplicate_email("bob@example.com"),
        ]);

        assert!(!result.succeeded());
        let codes: Vec<_> = result.errors().iter().map(|e| e.code).collect();
        assert_eq!(codes, ["DuplicateUserName", "DuplicateEmail"]);
        assert_eq!(result.to_string(), "Failed: DuplicateUserName,DuplicateEmail");
    }
}
