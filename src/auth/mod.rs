//! Authentication
//!
//! Bearer token extraction and OIDC access token validation:
//! - signature against the issuer's JWKS (fetched once at startup)
//! - audience, then issuer (trailing slashes ignored)
//! - required scope, reported separately so it can become a 403

mod bearer;
mod types;
mod validator;

#[cfg(test)]
pub(crate) mod testing;

pub use bearer::parse_bearer_token;
pub use types::{AccessClaims, AuthError, AuthInitError};
pub use validator::{has_scope, normalize_issuer, OidcValidator, TokenValidator, JWKS_PATH};
