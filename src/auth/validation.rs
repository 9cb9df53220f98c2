//! Client-side checks run before credentials leave the process.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PlintoError, Result};

const MIN_PASSWORD_LENGTH: usize = 8;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Reject addresses that are not `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(PlintoError::validation("email", "email is required"));
    }
    if !email_pattern().is_match(email) {
        return Err(PlintoError::validation(
            "email",
            format!("'{email}' is not a valid email address"),
        ));
    }
    Ok(())
}

/// Enforce the password policy used for new passwords.
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PlintoError::validation(
            "password",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    let checks: [(fn(char) -> bool, &str); 4] = [
        (|c: char| c.is_uppercase(), "an uppercase letter"),
        (|c: char| c.is_lowercase(), "a lowercase letter"),
        (|c: char| c.is_ascii_digit(), "a digit"),
        (|c: char| !c.is_alphanumeric(), "a special character"),
    ];
    for (check, requirement) in checks {
        if !password.chars().any(check) {
            return Err(PlintoError::validation(
                "password",
                format!("must contain {requirement}"),
            ));
        }
    }
    Ok(())
}

/// Sign-in only requires a non-empty password; the policy applies to new ones.
pub(crate) fn require_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(PlintoError::validation("password", "password is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses() {
        validate_email("a@b.com").unwrap();
        validate_email("first.last+tag@sub.example.co").unwrap();
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "   ", "plain", "a@b", "a b@c.com", "@b.com", "a@.com@"] {
            let err = validate_email(bad).unwrap_err();
            assert!(
                matches!(err, PlintoError::Validation { field: "email", .. }),
                "{bad:?} should be rejected, got {err:?}"
            );
        }
    }

    #[test]
    fn accepts_strong_password() {
        validate_password("Aa1!aaaa").unwrap();
    }

    #[test]
    fn reports_first_missing_requirement() {
        let cases = [
            ("Aa1!aaa", "at least 8"),
            ("aa1!aaaa", "uppercase"),
            ("AA1!AAAA", "lowercase"),
            ("Aa!aaaaa", "digit"),
            ("Aa1aaaaa", "special"),
        ];
        for (password, expected) in cases {
            let err = validate_password(password).unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{password}: expected '{expected}' in '{err}'"
            );
        }
    }

    #[test]
    fn require_password_only_checks_presence() {
        require_password("x").unwrap();
        assert!(require_password("").is_err());
    }
}
