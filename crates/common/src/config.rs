//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity token and role resolution configuration.
    pub auth: AuthConfig,
    /// Evidence photo storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
    /// ML classification endpoint configuration.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this service.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// What to do with a session whose identity has no role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleLookupFailurePolicy {
    /// Keep the session but leave the role empty; role-gated views are denied.
    #[default]
    ClearRole,
    /// Revoke the session; the caller must sign in again.
    SignOut,
}

/// Identity token verification and role resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared secret for HS256 identity tokens.
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// PEM-encoded RSA public key for RS256 identity tokens.
    #[serde(default)]
    pub jwt_public_key_pem: Option<String>,
    /// Expected `iss` claim.
    #[serde(default)]
    pub issuer: Option<String>,
    /// Expected `aud` claim.
    #[serde(default)]
    pub audience: Option<String>,
    /// Behaviour when neither role probe finds a record.
    #[serde(default)]
    pub role_lookup_failure: RoleLookupFailurePolicy,
}

/// Evidence photo storage.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding stored objects.
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,
    /// Public URL prefix under which stored objects are served.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// Bucket name; a sub-directory of `base_path`.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Largest accepted evidence photo, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            bucket: default_bucket(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// ML image classification endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Whether resolution by a supervisor is gated on classification.
    #[serde(default)]
    pub enabled: bool,
    /// Base URL of the classifier; `/predict` is appended.
    #[serde(default = "default_classifier_url")]
    pub url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_classifier_timeout")]
    pub timeout_secs: u64,
    /// Predictions below this confidence go to manual review.
    #[serde(default)]
    pub min_confidence: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_classifier_url(),
            timeout_secs: default_classifier_timeout(),
            min_confidence: 0.0,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./files")
}

fn default_storage_url() -> String {
    "http://localhost:3000/files".to_string()
}

fn default_bucket() -> String {
    "reports".to_string()
}

const fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_classifier_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_classifier_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `RIPPLE_ENV`)
    /// 4. Environment variables with `RIPPLE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("RIPPLE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RIPPLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("RIPPLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
