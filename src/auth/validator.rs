//! OIDC bearer token validation
//!
//! The signing keys are fetched once from `{issuer}/.well-known/jwks.json`
//! when the validator is built. Validation itself never touches the network.

use std::collections::HashMap;

use chrono::DateTime;
use jsonwebtoken::jwk::{JwkSet, KeyAlgorithm};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::types::{AccessClaims, AuthError, AuthInitError};

pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// Asymmetric algorithms only; a public key set cannot verify HMAC tokens.
const ACCEPTED_ALGORITHMS: &[Algorithm] = &[
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
    Algorithm::ES256,
    Algorithm::ES384,
    Algorithm::EdDSA,
];

/// Token validation capability injected into the request pipeline
pub trait TokenValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<AccessClaims, AuthError>;
}

struct SigningKey {
    key: DecodingKey,
    /// Pinned by the JWK `alg` member when present
    algorithm: Option<Algorithm>,
}

/// Validator backed by a fixed JWKS
pub struct OidcValidator {
    issuer: String,
    audience: String,
    scope: String,
    keys: HashMap<String, SigningKey>,
}

#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    iss: Option<String>,
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    scope: Option<serde_json::Value>,
    #[serde(default)]
    exp: Option<i64>,
}

impl OidcValidator {
    /// Fetch the issuer's key set and build a validator from it.
    pub async fn discover(
        authority: &str,
        audience: &str,
        scope: &str,
        client: &reqwest::Client,
    ) -> Result<Self, AuthInitError> {
        check_settings(authority, audience, scope)?;

        let jwks_uri = format!("{}{}", normalize_issuer(authority), JWKS_PATH);
        tracing::debug!(jwks_uri = %jwks_uri, "Fetching signing keys");

        let key_set: JwkSet = client
            .get(&jwks_uri)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Self::from_key_set(authority, audience, scope, key_set)
    }

    /// Build from an already loaded key set.
    pub fn from_key_set(
        authority: &str,
        audience: &str,
        scope: &str,
        key_set: JwkSet,
    ) -> Result<Self, AuthInitError> {
        check_settings(authority, audience, scope)?;

        let mut keys = HashMap::new();
        for jwk in &key_set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!("Skipping signing key without kid");
                continue;
            };
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    let algorithm = jwk.common.key_algorithm.and_then(signature_algorithm);
                    keys.insert(kid, SigningKey { key, algorithm });
                }
                Err(e) => {
                    tracing::warn!(kid = %kid, error = %e, "Skipping unusable signing key");
                }
            }
        }

        if keys.is_empty() {
            return Err(AuthInitError::EmptyKeySet);
        }

        tracing::info!(key_count = keys.len(), "Loaded signing keys");

        Ok(Self {
            issuer: normalize_issuer(authority).to_string(),
            audience: audience.to_string(),
            scope: scope.to_string(),
            keys,
        })
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl TokenValidator for OidcValidator {
    fn validate(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let header = decode_header(token)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let signing = header
            .kid
            .as_deref()
            .and_then(|kid| self.keys.get(kid))
            .ok_or_else(|| AuthError::UnknownKey(header.kid.clone()))?;
        if signing.algorithm.is_some_and(|alg| alg != header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        // Signature, expiry and audience
        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "aud"]);
        validation.validate_nbf = true;
        let claims = decode::<RawClaims>(token, &signing.key, &validation)?.claims;

        let issuer = claims.iss.as_deref().map(normalize_issuer);
        if issuer != Some(self.issuer.as_str()) {
            return Err(AuthError::IssuerMismatch {
                expected: self.issuer.clone(),
                actual: claims.iss,
            });
        }

        let scope = match claims.scope {
            Some(serde_json::Value::String(scope)) => scope,
            _ => return Err(AuthError::MissingScope(self.scope.clone())),
        };
        if !has_scope(&scope, &self.scope) {
            return Err(AuthError::MissingScope(self.scope.clone()));
        }

        Ok(AccessClaims {
            issuer: self.issuer.clone(),
            subject: claims.sub,
            scope,
            expires_at: claims.exp.and_then(|exp| DateTime::from_timestamp(exp, 0)),
        })
    }
}

fn check_settings(authority: &str, audience: &str, scope: &str) -> Result<(), AuthInitError> {
    if authority.is_empty() {
        return Err(AuthInitError::MissingSetting("authority"));
    }
    if audience.is_empty() {
        return Err(AuthInitError::MissingSetting("audience"));
    }
    if scope.is_empty() {
        return Err(AuthInitError::MissingSetting("scope"));
    }
    Ok(())
}

/// Strip trailing slashes so `https://a/` and `https://a` compare equal
pub fn normalize_issuer(issuer: &str) -> &str {
    issuer.trim_end_matches('/')
}

/// Whether `required` is one of the whitespace-delimited tokens of `scope`
pub fn has_scope(scope: &str, required: &str) -> bool {
    scope.split_whitespace().any(|s| s == required)
}

fn signature_algorithm(alg: KeyAlgorithm) -> Option<Algorithm> {
    match alg {
        KeyAlgorithm::HS256 => Some(Algorithm::HS256),
        KeyAlgorithm::HS384 => Some(Algorithm::HS384),
        KeyAlgorithm::HS512 => Some(Algorithm::HS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        // Key-encryption algorithms say nothing about signatures
        _ => None,
    }
}
