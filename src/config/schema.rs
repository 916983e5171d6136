//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request handling limits.
    pub http: HttpConfig,

    /// Credential settings.
    pub auth: AuthConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Data loaded into the store at startup.
    pub seed: SeedConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// HTTP handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum request body read by the request adapter, in bytes.
    pub max_body_size: usize,

    /// Hosting runtime timeout for a whole request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret. No default.
    pub jwt_secret: Option<String>,

    /// `iss` claim written into and required from every token.
    pub issuer: String,

    /// Access token lifetime in seconds.
    pub token_ttl_secs: u64,

    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    /// The configured secret, treating an empty string as absent.
    pub fn secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            issuer: "leoconnect".to_string(),
            token_ttl_secs: 24 * 60 * 60,
            bcrypt_cost: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Startup data for the store.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SeedConfig {
    pub clubs: Vec<ClubSeed>,
}

/// A club known at startup. Clubs have no create endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubSeed {
    pub id: String,
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}
