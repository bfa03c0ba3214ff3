//! `Authorization: Bearer` header parsing

use super::types::AuthError;

/// Extract the token from an `Authorization` header value.
///
/// The scheme match is case-insensitive; the token must be non-empty.
pub fn parse_bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = match header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingAuthorization),
    };

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::InvalidScheme)?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(AuthError::InvalidScheme);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_header() {
        assert_eq!(parse_bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert_eq!(parse_bearer_token(Some("bearer  abc ")).unwrap(), "abc");
        assert_eq!(parse_bearer_token(Some("BEARER abc")).unwrap(), "abc");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(parse_bearer_token(None), Err(AuthError::MissingAuthorization)));
        assert!(matches!(parse_bearer_token(Some("")), Err(AuthError::MissingAuthorization)));
    }

    #[test]
    fn test_wrong_scheme() {
        assert!(matches!(parse_bearer_token(Some("Basic dXNlcjpwdw==")), Err(AuthError::InvalidScheme)));
        assert!(matches!(parse_bearer_token(Some("Bearer")), Err(AuthError::InvalidScheme)));
    }

    #[test]
    fn test_empty_token() {
        assert!(matches!(parse_bearer_token(Some("Bearer    ")), Err(AuthError::MissingToken)));
    }
}
