use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub upstream: UpstreamConfig,
    pub payments: PaymentsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. When unset, profiles and notifications live in memory.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// YAML file of profiles and notifications loaded into the memory store.
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_expiry_hours: u64,
    pub strict_profiles: bool,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    pub verify_timeout_ms: u64,
    pub store_timeout_ms: u64,
    pub payment_timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_millis(self.verify_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn payment_timeout(&self) -> Duration {
        Duration::from_millis(self.payment_timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayPalMode {
    Sandbox,
    Live,
}

impl PayPalMode {
    pub fn default_api_base(&self) -> &'static str {
        match self {
            PayPalMode::Sandbox => "https://api-m.sandbox.paypal.com",
            PayPalMode::Live => "https://api-m.paypal.com",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsConfig {
    #[serde(skip_serializing)]
    pub stripe_secret_key: Option<String>,
    pub stripe_api_base: String,
    pub default_currency: String,
    pub paypal_client_id: Option<String>,
    #[serde(skip_serializing)]
    pub paypal_client_secret: Option<String>,
    pub paypal_mode: PayPalMode,
    pub paypal_api_base: Option<String>,
}

impl PaymentsConfig {
    pub fn paypal_base(&self) -> &str {
        self.paypal_api_base
            .as_deref()
            .unwrap_or_else(|| self.paypal_mode.default_api_base())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SECURITY_JWT_SECRET must not be empty")]
    MissingJwtSecret,
    #[error("invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },
    #[error("default currency must be a 3-letter code, got '{0}'")]
    InvalidCurrency(String),
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("STOREFRONT_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("STOREFRONT_HOST") {
            self.server.host = v;
        }

        // Database
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("SEED_FILE") {
            self.database.seed_file = Some(v);
        }

        // Security
        if let Some(v) = lookup("SECURITY_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_ISSUER") {
            self.security.jwt_issuer = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Some(v) = lookup("SECURITY_STRICT_PROFILES") {
            self.security.strict_profiles = v.parse().unwrap_or(self.security.strict_profiles);
        }
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        // Upstream timeouts
        if let Some(v) = lookup("UPSTREAM_VERIFY_TIMEOUT_MS") {
            self.upstream.verify_timeout_ms = v.parse().unwrap_or(self.upstream.verify_timeout_ms);
        }
        if let Some(v) = lookup("UPSTREAM_STORE_TIMEOUT_MS") {
            self.upstream.store_timeout_ms = v.parse().unwrap_or(self.upstream.store_timeout_ms);
        }
        if let Some(v) = lookup("UPSTREAM_PAYMENT_TIMEOUT_MS") {
            self.upstream.payment_timeout_ms = v.parse().unwrap_or(self.upstream.payment_timeout_ms);
        }

        // Payments
        if let Some(v) = lookup("STRIPE_SECRET_KEY") {
            self.payments.stripe_secret_key = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("STRIPE_API_BASE") {
            self.payments.stripe_api_base = v;
        }
        if let Some(v) = lookup("PAYMENTS_DEFAULT_CURRENCY") {
            self.payments.default_currency = v.to_lowercase();
        }
        if let Some(v) = lookup("PAYPAL_CLIENT_ID") {
            self.payments.paypal_client_id = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("PAYPAL_CLIENT_SECRET") {
            self.payments.paypal_client_secret = Some(v).filter(|s| !s.is_empty());
        }
        if let Some(v) = lookup("PAYPAL_MODE") {
            self.payments.paypal_mode = match v.as_str() {
                "live" => PayPalMode::Live,
                _ => PayPalMode::Sandbox,
            };
        }
        if let Some(v) = lookup("PAYPAL_API_BASE") {
            self.payments.paypal_api_base = Some(v).filter(|s| !s.is_empty());
        }

        self
    }

    /// Reject configurations the server must not start with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        let mut bases = vec![("STRIPE_API_BASE", self.payments.stripe_api_base.as_str())];
        if let Some(base) = self.payments.paypal_api_base.as_deref() {
            bases.push(("PAYPAL_API_BASE", base));
        }
        for (field, value) in bases {
            Url::parse(value).map_err(|_| ConfigError::InvalidUrl {
                field,
                value: value.to_string(),
            })?;
        }

        let currency = &self.payments.default_currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidCurrency(currency.clone()));
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                seed_file: None,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_issuer: None,
                jwt_expiry_hours: 24 * 7, // 1 week
                strict_profiles: false,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:9002".to_string()],
            },
            upstream: UpstreamConfig {
                verify_timeout_ms: 5_000,
                store_timeout_ms: 5_000,
                payment_timeout_ms: 15_000,
            },
            payments: PaymentsConfig::defaults(PayPalMode::Sandbox),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                seed_file: None,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: None,
                jwt_expiry_hours: 24,
                strict_profiles: false,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            upstream: UpstreamConfig {
                verify_timeout_ms: 3_000,
                store_timeout_ms: 3_000,
                payment_timeout_ms: 10_000,
            },
            payments: PaymentsConfig::defaults(PayPalMode::Sandbox),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                seed_file: None,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: None,
                jwt_expiry_hours: 4,
                strict_profiles: true,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            upstream: UpstreamConfig {
                verify_timeout_ms: 2_000,
                store_timeout_ms: 2_000,
                payment_timeout_ms: 10_000,
            },
            payments: PaymentsConfig::defaults(PayPalMode::Live),
        }
    }
}

impl PaymentsConfig {
    fn defaults(paypal_mode: PayPalMode) -> Self {
        Self {
            stripe_secret_key: None,
            stripe_api_base: "https://api.stripe.com".to_string(),
            default_currency: "kes".to_string(),
            paypal_client_id: None,
            paypal_client_secret: None,
            paypal_mode,
            paypal_api_base: None,
        }
    }
}
