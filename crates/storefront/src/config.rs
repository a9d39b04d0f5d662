//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain (e.g., lumiere-candles.myshopify.com)
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//!
//! ## Optional
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront (default: <http://localhost:3000>)
//! - `FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 75)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use lumiere_core::DEFAULT_FREE_SHIPPING_THRESHOLD;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Default Storefront API version.
pub const DEFAULT_API_VERSION: &str = "2024-01";

/// Blocklist of placeholder patterns copied out of `.env.example` files (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
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

/// Storefront server configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shopify Storefront API configuration
    pub shopify: ShopifyStorefrontConfig,
    /// Cart subtotal above which shipping is free
    pub free_shipping_threshold: Decimal,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Shopify Storefront API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyStorefrontConfig {
    /// Shopify store domain (e.g., lumiere-candles.myshopify.com)
    pub store_domain: String,
    /// Shopify API version (e.g., 2024-01)
    pub api_version: String,
    /// Storefront API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyStorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyStorefrontConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
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
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = get_or_default(&lookup, "STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_or_default(&lookup, "STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_or_default(&lookup, "STOREFRONT_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        let free_shipping_threshold = match lookup("FREE_SHIPPING_THRESHOLD") {
            Some(raw) => raw.trim().parse::<Decimal>().map_err(|e| {
                ConfigError::InvalidEnvVar("FREE_SHIPPING_THRESHOLD".to_string(), e.to_string())
            })?,
            None => DEFAULT_FREE_SHIPPING_THRESHOLD,
        };

        Ok(Self {
            host,
            port,
            base_url,
            shopify: ShopifyStorefrontConfig::from_lookup(&lookup)?,
            free_shipping_threshold,
            sentry_dsn: non_empty(lookup("SENTRY_DSN")),
            sentry_environment: non_empty(lookup("SENTRY_ENVIRONMENT")),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyStorefrontConfig {
    /// Load only the Shopify settings from the environment.
    ///
    /// Used by the CLI, which needs no server settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the domain or token is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let store_domain = get_required(lookup, "SHOPIFY_STORE_DOMAIN")?;
        let access_token = get_required(lookup, "SHOPIFY_STOREFRONT_ACCESS_TOKEN")?;
        reject_placeholder(&access_token, "SHOPIFY_STOREFRONT_ACCESS_TOKEN")?;

        Ok(Self {
            store_domain: store_domain.trim().trim_end_matches('/').to_string(),
            api_version: get_or_default(lookup, "SHOPIFY_API_VERSION", DEFAULT_API_VERSION),
            access_token: SecretString::from(access_token),
        })
    }

    /// The GraphQL endpoint URL for this store and API version.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            self.store_domain, self.api_version
        )
    }

    /// Expose the token for handing to the subscription widget SDK.
    #[must_use]
    pub fn expose_access_token(&self) -> &str {
        self.access_token.expose_secret()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    non_empty(lookup(key)).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_or_default(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    non_empty(lookup(key)).unwrap_or_else(|| default.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reject values that were obviously copied from an example file.
fn reject_placeholder(value: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("SHOPIFY_STORE_DOMAIN", "lumiere-candles.myshopify.com"),
        ("SHOPIFY_STOREFRONT_ACCESS_TOKEN", "3f9a1c2be47d8a6051f2c9e8d7b4a613"),
    ];

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(REQUIRED)).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.shopify.api_version, "2024-01");
        assert_eq!(config.free_shipping_threshold, Decimal::from(75));
        assert!(config.sentry_dsn.is_none());
        assert_eq!(
            config.shopify.endpoint(),
            "https://lumiere-candles.myshopify.com/api/2024-01/graphql.json"
        );
    }

    #[test]
    fn test_missing_domain() {
        let err = StorefrontConfig::from_lookup(lookup(&[(
            "SHOPIFY_STOREFRONT_ACCESS_TOKEN",
            "3f9a1c2be47d8a6051f2c9e8d7b4a613",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "SHOPIFY_STORE_DOMAIN"));
    }

    #[test]
    fn test_empty_token_is_missing() {
        let err = StorefrontConfig::from_lookup(lookup(&[
            ("SHOPIFY_STORE_DOMAIN", "lumiere-candles.myshopify.com"),
            ("SHOPIFY_STOREFRONT_ACCESS_TOKEN", "  "),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = StorefrontConfig::from_lookup(lookup(&[
            ("SHOPIFY_STORE_DOMAIN", "lumiere-candles.myshopify.com"),
            ("SHOPIFY_STOREFRONT_ACCESS_TOKEN", "your-storefront-token"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_invalid_port_and_threshold() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_PORT", "ninety"));
        assert!(matches!(
            StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::InvalidEnvVar(ref k, _) if k == "STOREFRONT_PORT"
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("FREE_SHIPPING_THRESHOLD", "lots"));
        assert!(matches!(
            StorefrontConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::InvalidEnvVar(ref k, _) if k == "FREE_SHIPPING_THRESHOLD"
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SHOPIFY_API_VERSION", "2025-04"),
            ("STOREFRONT_PORT", "8080"),
            ("FREE_SHIPPING_THRESHOLD", "50.00"),
            ("SENTRY_DSN", "https://key@o0.ingest.sentry.io/0"),
        ]);
        let config = StorefrontConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.shopify.api_version, "2025-04");
        assert_eq!(config.free_shipping_threshold, Decimal::from(50));
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_shopify_config_debug_redacts_token() {
        let config = ShopifyStorefrontConfig {
            store_domain: "lumiere-candles.myshopify.com".to_string(),
            api_version: "2024-01".to_string(),
            access_token: SecretString::from("super_secret_token_value"),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("lumiere-candles.myshopify.com"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_value"));
    }
}
