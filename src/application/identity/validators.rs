//! User and password validators
//!
//! Every rule is evaluated; failures are returned in rule order rather
//! than stopping at the first one.

use std::collections::HashSet;

use validator::ValidateEmail;

use super::options::{PasswordOptions, UserOptions};
use crate::domain::{DomainResult, IdentityError, User, UserRepositoryInterface};

/// Lookup key for user names and emails.
pub fn normalize(value: &str) -> String {
    value.to_uppercase()
}

/// Checks user name format and uniqueness, then email format and
/// uniqueness. Expects the normalized fields of `user` to be current.
pub async fn validate_user<R>(
    repo: &R,
    options: &UserOptions,
    user: &User,
) -> DomainResult<Vec<IdentityError>>
where
    R: UserRepositoryInterface + ?Sized,
{
    let mut errors = Vec::new();

    let allowed = &options.allowed_user_name_characters;
    let name_ok = !user.user_name.trim().is_empty()
        && (allowed.is_empty() || user.user_name.chars().all(|c| allowed.contains(c)));

    if !name_ok {
        errors.push(IdentityError::invalid_user_name(&user.user_name));
    } else if let Some(owner) = repo
        .get_user_by_normalized_user_name(&user.normalized_user_name)
        .await?
    {
        if owner.id != user.id {
            errors.push(IdentityError::duplicate_user_name(&user.user_name));
        }
    }

    if options.require_unique_email {
        match (user.email.as_ref(), user.normalized_email.as_deref()) {
            (Some(email), Some(normalized))
                if !email.trim().is_empty() && email.validate_email() =>
            {
                if let Some(owner) = repo.get_user_by_normalized_email(normalized).await? {
                    if owner.id != user.id {
                        errors.push(IdentityError::duplicate_email(email));
                    }
                }
            }
            (email, _) => {
                errors.push(IdentityError::invalid_email(
                    email.map(String::as_str).unwrap_or_default(),
                ));
            }
        }
    }

    Ok(errors)
}

pub fn validate_password(options: &PasswordOptions, password: &str) -> Vec<IdentityError> {
    let mut errors = Vec::new();

    if password.chars().count() < options.required_length {
        errors.push(IdentityError::password_too_short(options.required_length));
    }
    if options.require_non_alphanumeric && password.chars().all(char::is_alphanumeric) {
        errors.push(IdentityError::password_requires_non_alphanumeric());
    }
    if options.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(IdentityError::password_requires_digit());
    }
    if options.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(IdentityError::password_requires_lower());
    }
    if options.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(IdentityError::password_requires_upper());
    }
    if options.required_unique_chars >= 1
        && password.chars().collect::<HashSet<_>>().len() < options.required_unique_chars
    {
        errors.push(IdentityError::password_requires_unique_chars(
            options.required_unique_chars,
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(errors: &[IdentityError]) -> Vec<&'static str> {
        errors.iter().map(|e| e.code).collect()
    }

    #[test]
    fn strong_password_passes_default_policy() {
        assert!(validate_password(&PasswordOptions::default(), "Passw0rd!").is_empty());
    }

    #[test]
    fn weak_password_reports_every_broken_rule() {
        let errors = validate_password(&PasswordOptions::default(), "abc");
        assert_eq!(
            codes(&errors),
            [
                "PasswordTooShort",
                "PasswordRequiresNonAlphanumeric",
                "PasswordRequiresDigit",
                "PasswordRequiresUpper",
            ]
        );
        assert_eq!(
            errors[0].description,
            "Passwords must be at least 6 characters."
        );
    }

    #[test]
    fn unique_chars_rule_counts_distinct_characters() {
        let options = PasswordOptions {
            required_length: 1,
            required_unique_chars: 3,
            require_non_alphanumeric: false,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
        };

        assert_eq!(
            codes(&validate_password(&options, "aaaaaa")),
            ["PasswordRequiresUniqueChars"]
        );
        assert!(validate_password(&options, "abcabc").is_empty());
    }

    #[test]
    fn relaxed_policy_only_checks_length() {
        let options = PasswordOptions {
            required_length: 4,
            required_unique_chars: 0,
            require_non_alphanumeric: false,
            require_digit: false,
            require_lowercase: false,
            require_uppercase: false,
        };

        assert!(validate_password(&options, "pass").is_empty());
        assert_eq!(codes(&validate_password(&options, "abc")), ["PasswordTooShort"]);
    }

    #[test]
    fn normalize_is_case_insensitive_key() {
        assert_eq!(normalize("Alice@Example.com"), normalize("ALICE@example.COM"));
    }
}
