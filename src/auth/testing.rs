//! Token fixtures shared by auth and route tests

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use super::validator::OidcValidator;

pub const TEST_ISSUER: &str = "https://login.example.com";
pub const TEST_AUDIENCE: &str = "api://pdf-service";
pub const TEST_SCOPE: &str = "pdf#create";
pub const TEST_KID: &str = "test-key";

/// Private half of the key published in `testdata/jwks.json`
pub const SIGNING_KEY_PEM: &str = include_str!("../../testdata/signing_key.pem");
/// A key the issuer never published
pub const FOREIGN_KEY_PEM: &str = include_str!("../../testdata/foreign_key.pem");

pub fn test_jwks() -> JwkSet {
    serde_json::from_str(include_str!("../../testdata/jwks.json")).unwrap()
}

pub fn test_validator() -> OidcValidator {
    OidcValidator::from_key_set(TEST_ISSUER, TEST_AUDIENCE, TEST_SCOPE, test_jwks()).unwrap()
}

pub fn default_claims() -> serde_json::Value {
    json!({
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "sub": "client-123",
        "scope": format!("openid {}", TEST_SCOPE),
        "exp": chrono::Utc::now().timestamp() + 3600,
    })
}

pub fn sign(claims: &serde_json::Value) -> String {
    sign_with(SIGNING_KEY_PEM, Some(TEST_KID), Algorithm::RS256, claims)
}

pub fn sign_with(pem: &str, kid: Option<&str>, alg: Algorithm, claims: &serde_json::Value) -> String {
    let header = Header {
        kid: kid.map(str::to_string),
        ..Header::new(alg)
    };
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
    encode(&header, claims, &key).unwrap()
}
