//! Configuration management for the PDF service

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
    pub sandbox: SandboxConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Service name recorded in logs
    pub service_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// OIDC issuer; the JWKS lives at `{authority}/.well-known/jwks.json`
    pub authority: String,
    pub audience: String,
    pub required_scope: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_request_bytes: u64,
    /// Upper bound on one render, started once ingestion has finished
    pub request_timeout: Duration,
    /// Upper bound on reading and saving the multipart body
    pub ingest_timeout: Duration,
    /// Parent directory of per-request workspaces (system temp dir when unset)
    pub workspace_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub bwrap_path: PathBuf,
    pub weasyprint_path: PathBuf,
    /// Host stylesheet bound read-only into every sandbox
    pub default_stylesheet_path: PathBuf,
}

pub const DEFAULT_REQUIRED_SCOPE: &str = "pdf#create";
pub const DEFAULT_MAX_REQUEST_BYTES: u64 = 104_857_600;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_INGEST_TIMEOUT_SECS: u64 = 30;
/// Timeouts above one day are rejected
pub const MAX_TIMEOUT_SECS: u64 = 86_400;

impl Default for LimitsConfig {
    fn default() -> Self {
        LimitsConfig {
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            ingest_timeout: Duration::from_secs(DEFAULT_INGEST_TIMEOUT_SECS),
            workspace_dir: None,
        }
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        SandboxConfig {
            bwrap_path: PathBuf::from("bwrap"),
            weasyprint_path: PathBuf::from("weasyprint"),
            default_stylesheet_path: PathBuf::from("assets/default.css"),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        Ok(Config {
            server: ServerConfig {
                host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("PORT", get("PORT"), 8080)?,
                service_name: get("OTEL_SERVICE_NAME"),
            },
            auth: AuthConfig {
                authority: require("AUTH_AUTHORITY")?,
                audience: require("AUTH_AUDIENCE")?,
                required_scope: get("AUTH_REQUIRED_SCOPE")
                    .unwrap_or_else(|| DEFAULT_REQUIRED_SCOPE.to_string()),
            },
            limits: LimitsConfig {
                max_request_bytes: parse_or(
                    "MAX_REQUEST_BYTES",
                    get("MAX_REQUEST_BYTES"),
                    DEFAULT_MAX_REQUEST_BYTES,
                )?,
                request_timeout: parse_timeout(
                    "REQUEST_TIMEOUT_SECS",
                    get("REQUEST_TIMEOUT_SECS"),
                    DEFAULT_REQUEST_TIMEOUT_SECS,
                )?,
                ingest_timeout: parse_timeout(
                    "INGEST_TIMEOUT_SECS",
                    get("INGEST_TIMEOUT_SECS"),
                    DEFAULT_INGEST_TIMEOUT_SECS,
                )?,
                workspace_dir: get("WORKSPACE_DIR").map(PathBuf::from),
            },
            sandbox: SandboxConfig {
                bwrap_path: get("BWRAP_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("bwrap")),
                weasyprint_path: get("WEASYPRINT_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("weasyprint")),
                default_stylesheet_path: get("DEFAULT_STYLESHEET_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("assets/default.css")),
            },
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

/// Whole seconds in `1..=MAX_TIMEOUT_SECS`
fn parse_timeout(
    name: &'static str,
    value: Option<String>,
    default_secs: u64,
) -> Result<Duration, ConfigError> {
    let secs = parse_or(name, value, default_secs)?;
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            ("AUTH_AUTHORITY", "https://login.example.com/"),
            ("AUTH_AUDIENCE", "api://pdf"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.required_scope, "pdf#create");
        assert_eq!(config.limits.max_request_bytes, 104_857_600);
        assert_eq!(config.limits.request_timeout, Duration::from_secs(120));
        assert_eq!(config.limits.ingest_timeout, Duration::from_secs(30));
        assert_eq!(config.sandbox.bwrap_path, PathBuf::from("bwrap"));
        assert_eq!(
            config.sandbox.default_stylesheet_path,
            PathBuf::from("assets/default.css")
        );
        assert!(config.server.service_name.is_none());
    }

    #[test]
    fn test_missing_authority_fails() {
        let err = Config::from_lookup(lookup(&[("AUTH_AUDIENCE", "api://pdf")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_AUTHORITY")));
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("AUTH_AUTHORITY", "https://login.example.com"),
            ("AUTH_AUDIENCE", "   "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_AUDIENCE")));
    }

    #[test]
    fn test_invalid_number_fails() {
        let err = Config::from_lookup(lookup(&[
            ("AUTH_AUTHORITY", "https://login.example.com"),
            ("AUTH_AUDIENCE", "api://pdf"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("AUTH_AUTHORITY", "https://login.example.com"),
            ("AUTH_AUDIENCE", "api://pdf"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("INGEST_TIMEOUT_SECS", "7"),
            ("MAX_REQUEST_BYTES", "1024"),
            ("WORKSPACE_DIR", "/var/tmp/pdf"),
            ("OTEL_SERVICE_NAME", "pdf-service"),
        ]))
        .unwrap();

        assert_eq!(config.limits.request_timeout, Duration::from_secs(5));
        assert_eq!(config.limits.ingest_timeout, Duration::from_secs(7));
        assert_eq!(config.limits.max_request_bytes, 1024);
        assert_eq!(config.limits.workspace_dir, Some(PathBuf::from("/var/tmp/pdf")));
        assert_eq!(config.server.service_name.as_deref(), Some("pdf-service"));
    }

    #[test]
    fn test_out_of_range_timeouts_fail() {
        for (name, value) in [
            ("REQUEST_TIMEOUT_SECS", "18446744073709551615"),
            ("REQUEST_TIMEOUT_SECS", "86401"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("INGEST_TIMEOUT_SECS", "18446744073709551615"),
        ] {
            let err = Config::from_lookup(lookup(&[
                ("AUTH_AUTHORITY", "https://login.example.com"),
                ("AUTH_AUDIENCE", "api://pdf"),
                (name, value),
            ]))
            .unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { name: n, .. } if n == name),
                "{name}={value}"
            );
        }

        let config = Config::from_lookup(lookup(&[
            ("AUTH_AUTHORITY", "https://login.example.com"),
            ("AUTH_AUDIENCE", "api://pdf"),
            ("REQUEST_TIMEOUT_SECS", "86400"),
        ]))
        .unwrap();
        assert_eq!(config.limits.request_timeout, Duration::from_secs(MAX_TIMEOUT_SECS));
    }
}
