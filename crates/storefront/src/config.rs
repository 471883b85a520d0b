//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `WAVECREST_DATABASE_URL` - `PostgreSQL` connection string
//! - `WAVECREST_BASE_URL` - Public URL for the storefront
//! - `WAVECREST_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `DOCSTORE_ENDPOINT` - Document store REST endpoint
//! - `DOCSTORE_API_KEY` - Document store API key
//! - `IDENTITY_ENDPOINT` - Identity provider endpoint
//! - `IDENTITY_API_KEY` - Identity provider API key
//! - `PAYMENT_MOCK_ENDPOINT` - Mock card payment endpoint
//! - `GCASH_ENDPOINT` - GCash checkout API endpoint
//! - `GCASH_CLIENT_ID` - GCash API client ID
//! - `GCASH_CLIENT_SECRET` - GCash API client secret
//!
//! ## Optional
//! - `WAVECREST_HOST` - Bind address (default: 127.0.0.1)
//! - `WAVECREST_PORT` - Listen port (default: 3000)
//! - `EMAILJS_ENDPOINT` / `EMAILJS_SERVICE_ID` / `EMAILJS_TEMPLATE_ID` /
//!   `EMAILJS_PUBLIC_KEY` - Email receipts (all four or none)
//! - `TWILIO_ENDPOINT` / `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` /
//!   `TWILIO_FROM_NUMBER` - SMS receipts (all four or none)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
    #[error("Incomplete configuration group {0}: {1}")]
    IncompleteGroup(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Document store configuration
    pub docstore: DocStoreConfig,
    /// Identity provider configuration
    pub identity: IdentityConfig,
    /// Mock card payment configuration
    pub mock_payment: MockPaymentConfig,
    /// GCash redirect payment configuration
    pub gcash: GcashConfig,
    /// Email receipt configuration (absent disables email receipts)
    pub email_receipts: Option<EmailReceiptConfig>,
    /// SMS receipt configuration (absent disables SMS receipts)
    pub sms_receipts: Option<SmsReceiptConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Document store REST API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DocStoreConfig {
    /// Document store endpoint (no trailing slash)
    pub endpoint: String,
    /// Bearer token for the store API
    pub api_key: SecretString,
}

impl std::fmt::Debug for DocStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Identity provider configuration.
#[derive(Clone)]
pub struct IdentityConfig {
    /// Identity provider endpoint (no trailing slash)
    pub endpoint: String,
    /// Provider API key, sent as a query parameter
    pub api_key: SecretString,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Mock card payment endpoint configuration.
#[derive(Debug, Clone)]
pub struct MockPaymentConfig {
    /// Full URL of the mock charge endpoint
    pub endpoint: String,
}

/// GCash redirect payment configuration.
#[derive(Clone)]
pub struct GcashConfig {
    /// GCash API endpoint (no trailing slash)
    pub endpoint: String,
    /// API client ID
    pub client_id: String,
    /// API client secret
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GcashConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcashConfig")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Email receipt (EmailJS-style) configuration.
#[derive(Debug, Clone)]
pub struct EmailReceiptConfig {
    pub endpoint: String,
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
}

/// SMS receipt (Twilio-style) configuration.
#[derive(Clone)]
pub struct SmsReceiptConfig {
    pub endpoint: String,
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
}

impl std::fmt::Debug for SmsReceiptConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsReceiptConfig")
            .field("endpoint", &self.endpoint)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("WAVECREST_DATABASE_URL")?;
        let host = get_env_or_default("WAVECREST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("WAVECREST_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("WAVECREST_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("WAVECREST_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("WAVECREST_BASE_URL")?;
        let session_secret = get_validated_secret("WAVECREST_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "WAVECREST_SESSION_SECRET")?;

        let docstore = DocStoreConfig {
            endpoint: get_required_env("DOCSTORE_ENDPOINT")?,
            api_key: get_validated_secret("DOCSTORE_API_KEY")?,
        };
        let identity = IdentityConfig {
            endpoint: get_required_env("IDENTITY_ENDPOINT")?,
            api_key: get_validated_secret("IDENTITY_API_KEY")?,
        };
        let mock_payment = MockPaymentConfig {
            endpoint: get_required_env("PAYMENT_MOCK_ENDPOINT")?,
        };
        let gcash = GcashConfig {
            endpoint: get_required_env("GCASH_ENDPOINT")?,
            client_id: get_required_env("GCASH_CLIENT_ID")?,
            client_secret: get_validated_secret("GCASH_CLIENT_SECRET")?,
        };

        let email_receipts = EmailReceiptConfig::from_env()?;
        let sms_receipts = SmsReceiptConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            docstore,
            identity,
            mock_payment,
            gcash,
            email_receipts,
            sms_receipts,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailReceiptConfig {
    /// All four variables present enables email receipts; all four absent
    /// disables them; a partial set is a configuration error.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let vars = [
            "EMAILJS_ENDPOINT",
            "EMAILJS_SERVICE_ID",
            "EMAILJS_TEMPLATE_ID",
            "EMAILJS_PUBLIC_KEY",
        ];
        match optional_group("EMAILJS", &vars)? {
            Some([endpoint, service_id, template_id, public_key]) => Ok(Some(Self {
                endpoint,
                service_id,
                template_id,
                public_key,
            })),
            None => Ok(None),
        }
    }
}

impl SmsReceiptConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let vars = [
            "TWILIO_ENDPOINT",
            "TWILIO_ACCOUNT_SID",
            "TWILIO_AUTH_TOKEN",
            "TWILIO_FROM_NUMBER",
        ];
        match optional_group("TWILIO", &vars)? {
            Some([endpoint, account_sid, auth_token, from_number]) => Ok(Some(Self {
                endpoint,
                account_sid,
                auth_token: SecretString::from(auth_token),
                from_number,
            })),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Read an all-or-nothing group of variables.
fn optional_group<const N: usize>(
    group: &str,
    keys: &[&str; N],
) -> Result<Option<[String; N]>, ConfigError> {
    let values: Vec<Option<String>> = keys.iter().map(|k| get_optional_env(k)).collect();
    let present = values.iter().filter(|v| v.is_some()).count();

    if present == 0 {
        return Ok(None);
    }
    if present < N {
        let missing: Vec<&str> = keys
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect();
        return Err(ConfigError::IncompleteGroup(
            group.to_string(),
            format!("missing {}", missing.join(", ")),
        ));
    }

    let mut out = std::array::from_fn(|_| String::new());
    for (slot, value) in out.iter_mut().zip(values) {
        if let Some(value) = value {
            *slot = value;
        }
    }
    Ok(Some(out))
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
