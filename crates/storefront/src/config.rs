//! Notification service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SMTP_HOST` - SMTP relay hostname (STARTTLS)
//! - `SMTP_USERNAME` - SMTP login, also the default sender
//! - `SMTP_PASSWORD` - SMTP password or app password
//! - `OWNER_EMAIL` - Shop owner mailbox that receives new-order alerts
//!
//! ## Optional
//! - `ICONIQUE_HOST` - Bind address (default: 127.0.0.1)
//! - `ICONIQUE_PORT` - Listen port (default: 5000)
//! - `ICONIQUE_STORE_NAME` - Store name used in emails (default: The Iconique)
//! - `ICONIQUE_CORS_ORIGIN` - Storefront origin allowed to call the API
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `MAIL_FROM` - Sender address (default: `SMTP_USERNAME`)
//! - `SUPPORT_EMAIL` - Address customers are told to contact (default: `MAIL_FROM`)
//! - `MAIL_SEND_TIMEOUT_SECS` - Upper bound for sending both emails (default: 30)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE` - Sentry error tracking

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use iconique_core::Email;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_STORE_NAME: &str = "The Iconique";
const DEFAULT_SMTP_PORT: &str = "587";
const DEFAULT_SEND_TIMEOUT_SECS: &str = "30";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
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
}

/// Notification service configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Store name shown in subjects and email bodies
    pub store_name: String,
    /// Origin allowed to call the API cross-site (CORS disabled when unset)
    pub cors_origin: Option<String>,
    /// Outgoing mail configuration
    pub email: EmailConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Outgoing mail configuration.
///
/// Implements `Debug` manually to redact the SMTP password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Sender address (From header, CC on owner alerts)
    pub from_address: Email,
    /// Shop owner address for new-order alerts
    pub owner_address: Email,
    /// Contact address printed in customer emails
    pub support_address: Email,
    /// Upper bound for delivering both order emails
    pub send_timeout: Duration,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .field("owner_address", &self.owner_address)
            .field("support_address", &self.support_address)
            .field("send_timeout", &self.send_timeout)
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
    /// if the SMTP password looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parsed::<IpAddr>("ICONIQUE_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("ICONIQUE_PORT", "5000")?;
        let store_name = env.or_default("ICONIQUE_STORE_NAME", DEFAULT_STORE_NAME);
        let cors_origin = env.optional("ICONIQUE_CORS_ORIGIN");
        let email = EmailConfig::from_env(&env)?;

        let sentry_dsn = env.optional("SENTRY_DSN");
        let sentry_environment = env.optional("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = env
            .optional("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = env
            .optional("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            host,
            port,
            store_name,
            cors_origin,
            email,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    fn from_env(env: &Env<'_>) -> Result<Self, ConfigError> {
        let smtp_host = env.required("SMTP_HOST")?;
        let smtp_port = env.parsed::<u16>("SMTP_PORT", DEFAULT_SMTP_PORT)?;
        let smtp_username = env.required("SMTP_USERNAME")?;
        let smtp_password = env.required("SMTP_PASSWORD")?;
        reject_placeholder(&smtp_password, "SMTP_PASSWORD")?;

        let from_raw = env
            .optional("MAIL_FROM")
            .unwrap_or_else(|| smtp_username.clone());
        let from_address = parse_address(&from_raw, "MAIL_FROM")?;
        let owner_address = parse_address(&env.required("OWNER_EMAIL")?, "OWNER_EMAIL")?;
        let support_address = match env.optional("SUPPORT_EMAIL") {
            Some(raw) => parse_address(&raw, "SUPPORT_EMAIL")?,
            None => from_address.clone(),
        };

        let timeout_secs = env.parsed::<u64>("MAIL_SEND_TIMEOUT_SECS", DEFAULT_SEND_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "MAIL_SEND_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password: SecretString::from(smtp_password),
            from_address,
            owner_address,
            support_address,
            send_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup with the usual required/optional/default accessors.
struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

fn parse_address(raw: &str, key: &str) -> Result<Email, ConfigError> {
    Email::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject secrets that are obviously copied from a sample `.env`.
fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("SMTP_HOST", "smtp.gmail.com"),
        ("SMTP_USERNAME", "orders@theiconique.pk"),
        ("SMTP_PASSWORD", "qwpe zmxn ruty alsk"),
        ("OWNER_EMAIL", "owner@theiconique.pk"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(MINIMAL).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5000");
        assert_eq!(config.store_name, "The Iconique");
        assert!(config.cors_origin.is_none());
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.email.from_address.as_str(), "orders@theiconique.pk");
        assert_eq!(config.email.support_address.as_str(), "orders@theiconique.pk");
        assert_eq!(config.email.send_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            ("ICONIQUE_PORT", "8080"),
            ("ICONIQUE_STORE_NAME", "Iconique Lahore"),
            ("MAIL_FROM", "noreply@theiconique.pk"),
            ("SUPPORT_EMAIL", "care@theiconique.pk"),
            ("MAIL_SEND_TIMEOUT_SECS", "5"),
        ]);
        let config = load(&vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.store_name, "Iconique Lahore");
        assert_eq!(config.email.from_address.as_str(), "noreply@theiconique.pk");
        assert_eq!(config.email.support_address.as_str(), "care@theiconique.pk");
        assert_eq!(config.email.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_required() {
        let vars: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "OWNER_EMAIL")
            .collect();
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "OWNER_EMAIL"));
    }

    #[test]
    fn test_invalid_values() {
        let mut vars = MINIMAL.to_vec();
        vars.push(("ICONIQUE_PORT", "not-a-port"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(ref key, _) if key == "ICONIQUE_PORT"
        ));

        let mut bad_owner: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "OWNER_EMAIL")
            .collect();
        bad_owner.push(("OWNER_EMAIL", "owner-at-shop"));
        assert!(matches!(
            load(&bad_owner).unwrap_err(),
            ConfigError::InvalidEnvVar(ref key, _) if key == "OWNER_EMAIL"
        ));

        let mut zero_timeout = MINIMAL.to_vec();
        zero_timeout.push(("MAIL_SEND_TIMEOUT_SECS", "0"));
        assert!(load(&zero_timeout).is_err());
    }

    #[test]
    fn test_placeholder_password_rejected() {
        let mut vars: Vec<_> = MINIMAL
            .iter()
            .copied()
            .filter(|(k, _)| *k != "SMTP_PASSWORD")
            .collect();
        vars.push(("SMTP_PASSWORD", "your-app-password"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InsecureSecret(_, _)
        ));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = load(MINIMAL).unwrap();
        let debug_output = format!("{:?}", config.email);

        assert!(debug_output.contains("smtp.gmail.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("qwpe zmxn ruty alsk"));
    }
}
