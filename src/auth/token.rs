use rand::Rng;

use crate::error::{Error, Result};

const TOKEN_PREFIX: &str = "hireline";
const LOOKUP_LENGTH: usize = 8;
const SECRET_LENGTH: usize = 24;
const SECRET_BYTES: usize = 12;

/// Sessions expire this many days after login.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Generates a new session token with the format: hireline_<lookup>_<secret>
/// Returns (raw_token, lookup). Only the argon2 hash of the raw token is
/// ever persisted.
#[must_use]
pub fn generate_token() -> (String, String) {
    let lookup = generate_lookup();
    let secret = generate_secret();
    let raw_token = format!("{TOKEN_PREFIX}_{lookup}_{secret}");
    (raw_token, lookup)
}

/// Generates the lookup portion of the token (first 8 chars of a UUID)
#[must_use]
fn generate_lookup() -> String {
    let uuid = uuid::Uuid::new_v4();
    uuid.to_string()[..LOOKUP_LENGTH].to_string()
}

/// Generates a cryptographically secure random hex string for the secret
#[must_use]
fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)[..SECRET_LENGTH].to_string()
}

/// Parses a token string into its components (lookup, secret)
pub fn parse_token(token: &str) -> Result<(String, String)> {
    let prefix = format!("{TOKEN_PREFIX}_");
    if !token.starts_with(&prefix) {
        return Err(Error::InvalidTokenFormat);
    }

    let parts: Vec<&str> = token.split('_').collect();
    if parts.len() != 3 {
        return Err(Error::InvalidTokenFormat);
    }

    let lookup = parts[1];
    let secret = parts[2];

    if lookup.len() != LOOKUP_LENGTH || secret.len() != SECRET_LENGTH {
        return Err(Error::InvalidTokenFormat);
    }

    Ok((lookup.to_string(), secret.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_generation_format() {
        let (token, lookup) = generate_token();

        assert!(token.starts_with("hireline_"));
        assert_eq!(lookup.len(), 8);

        let parts: Vec<&str> = token.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "hireline");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 24);
    }

    #[test]
    fn test_parse_token_valid() {
        let (lookup, secret) = parse_token("hireline_12345678_123456789012345678901234").unwrap();
        assert_eq!(lookup, "12345678");
        assert_eq!(secret, "123456789012345678901234");
    }

    #[test]
    fn test_parse_token_invalid_prefix() {
        let result = parse_token("invalid_12345678_123456789012345678901234");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_token_wrong_parts() {
        let result = parse_token("hireline_12345678");
        assert!(result.is_err());
    }

    #[test]
    fn test_generated_token_round_trips() {
        let (token, lookup) = generate_token();
        let (parsed_lookup, _secret) = parse_token(&token).unwrap();
        assert_eq!(parsed_lookup, lookup);
    }
}
