pub(crate) use crate::config::auth::AuthConfig;
pub(crate) use crate::config::cache::{CacheConfig, CacheStore};
pub(crate) use crate::config::database::DatabaseConfig;
use confique::Config;

pub mod auth;
pub mod cache;
pub mod database;

/// Optional configuration file read below environment variables
const CONFIG_FILE: &str = "drinks.toml";

/// Main configuration structure for the drinks server
#[derive(Debug, Config, Clone)]
pub struct AppConfig {
    /// The port the server will listen to (default: 5000)
    #[config(env = "DRINKS_PORT", default = 5000)]
    pub port: u16,

    /// Relational store configuration
    #[config(nested)]
    pub database: DatabaseConfig,

    /// Identity provider configuration
    #[config(nested)]
    pub auth: AuthConfig,

    /// Signing key cache configuration
    #[config(nested)]
    pub jwks_cache: CacheConfig,
}

impl AppConfig {
    /// Loads the configuration from `DRINKS_*` environment variables and `drinks.toml`
    pub fn new() -> Result<Self, String> {
        let config = Self::builder()
            .env()
            .file(CONFIG_FILE)
            .load()
            .map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects combinations that would only fail once requests arrive
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.domain.trim().is_empty() {
            return Err("DRINKS_AUTH_DOMAIN must not be empty".to_string());
        }
        if self.auth.audience.trim().is_empty() {
            return Err("DRINKS_AUTH_AUDIENCE must not be empty".to_string());
        }
        if self.auth.jwks_timeout == 0 {
            return Err("DRINKS_AUTH_JWKS_TIMEOUT must be at least 1 second".to_string());
        }
        self.auth.algorithm()?;
        self.auth.jwks_url()?;
        Ok(())
    }

    #[cfg(test)]
    pub fn for_test_with_mocks(jwks_mock: &wiremock::MockServer) -> Self {
        Self {
            port: 0, // Let the OS choose a port
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                // every connection to an in-memory database is a fresh database
                max_connections: 1,
                acquire_timeout: 5,
                reset_on_startup: false,
            },
            auth: AuthConfig {
                domain: "coffee.test.auth0.com".to_string(),
                audience: "coffeeshop".to_string(),
                algorithm: "RS256".to_string(),
                jwks_url: Some(format!("{}/.well-known/jwks.json", jwks_mock.uri())),
                jwks_timeout: 2,
                leeway: 0,
            },
            jwks_cache: CacheConfig {
                store: CacheStore::InMemory,
                ttl: 60,
                capacity: 1,
            },
        }
    }
}
