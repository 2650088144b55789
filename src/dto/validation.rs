//! Validation helpers for DTOs.

use validator::ValidationError;

/// Minimum number of characters in a username.
pub const USERNAME_MIN_CHARS: usize = 2;

/// Validates that a username has at least [`USERNAME_MIN_CHARS`] characters.
///
/// # Examples
///
/// ```ignore
/// validate_username("ab") // Ok
/// validate_username("a")  // Err - too short
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let count = username.chars().count();
    if count < USERNAME_MIN_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be at least {USERNAME_MIN_CHARS} characters (got {count})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username_valid() {
        assert!(validate_username("ab").is_ok());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("éé").is_ok()); // counted in chars, not bytes
    }

    #[test]
    fn test_validate_username_too_short() {
        assert!(validate_username("").is_err());
        assert!(validate_username("a").is_err());
        assert!(validate_username("é").is_err());
    }
}
