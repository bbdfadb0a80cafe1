use confique::Config;
use std::time::Duration;

/// Configuration for the relational store holding the drinks table
#[derive(Debug, Config, Clone)]
pub struct DatabaseConfig {
    /// Connection string (default: sqlite://drinks.db?mode=rwc)
    #[config(env = "DRINKS_DATABASE_URL", default = "sqlite://drinks.db?mode=rwc")]
    pub url: String,

    /// Maximum number of pooled connections (default: 5)
    #[config(env = "DRINKS_DATABASE_MAX_CONNECTIONS", default = 5)]
    pub max_connections: u32,

    /// Seconds to wait for a free connection before failing (default: 5)
    #[config(env = "DRINKS_DATABASE_ACQUIRE_TIMEOUT", default = 5)]
    pub acquire_timeout: u64,

    /// Drop all records and seed the table on startup (default: false)
    #[config(env = "DRINKS_DATABASE_RESET_ON_STARTUP", default = false)]
    pub reset_on_startup: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }
}
