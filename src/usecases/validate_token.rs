//! Bearer token check for the execute endpoint.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid token")]
pub struct InvalidToken;

/// Compares the caller's token against the configured secret.
///
/// An empty secret disables the check.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    secret: String,
}

impl TokenValidator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Strip `Bearer ` and spaces from the header value and compare.
    pub fn clean_and_match(&self, token: &str) -> Result<(), InvalidToken> {
        if !self.is_enabled() {
            return Ok(());
        }
        let token = token.replace("Bearer ", "").replace(' ', "");
        if token.is_empty() || token != self.secret {
            return Err(InvalidToken);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_accepts_anything() {
        let validator = TokenValidator::new("");
        assert!(validator.clean_and_match("").is_ok());
        assert!(validator.clean_and_match("Bearer whatever").is_ok());
    }

    #[test]
    fn bearer_prefix_and_spaces_are_ignored() {
        let validator = TokenValidator::new("s3cret");
        assert!(validator.clean_and_match("Bearer s3cret").is_ok());
        assert!(validator.clean_and_match("s3cret").is_ok());
        assert!(validator.clean_and_match(" s3 cret ").is_ok());
    }

    #[test]
    fn missing_or_wrong_token_is_rejected() {
        let validator = TokenValidator::new("s3cret");
        assert_eq!(validator.clean_and_match(""), Err(InvalidToken));
        assert_eq!(validator.clean_and_match("Bearer "), Err(InvalidToken));
        assert_eq!(validator.clean_and_match("Bearer other"), Err(InvalidToken));
        assert_eq!(InvalidToken.to_string(), "invalid token");
    }
}
