use crate::{
    auth::TokenVerifier,
    cache::create_cache,
    config::AppConfig,
    store::DrinkStore,
};
use log::{error, info};
use std::sync::Arc;

/// Everything the handlers need, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: DrinkStore,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    /// Connects the store, prepares its schema and builds the token verifier
    pub async fn new(config: AppConfig) -> Result<Self, String> {
        let store = DrinkStore::connect(&config.database)
            .await
            .map_err(|e| format!("Failed to connect to database: {e}"))?;

        if config.database.reset_on_startup {
            store
                .reset()
                .await
                .map_err(|e| format!("Failed to reset database: {e}"))?;
        } else {
            store
                .bootstrap()
                .await
                .map_err(|e| format!("Failed to create schema: {e}"))?;
        }

        let cache = create_cache(&config.jwks_cache)
            .map_err(|e| format!("Failed to create key cache: {e}"))?;
        let verifier = TokenVerifier::new(&config.auth, cache)?;
        info!(
            "Accepting tokens issued by {} for audience '{}'",
            config.auth.issuer(),
            config.auth.audience
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            verifier: Arc::new(verifier),
        })
    }

    /// Check if the store answers queries
    pub async fn store_healthy(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                error!("Store health check failed: {}", e);
                false
            }
        }
    }

    /// Check if the signing key cache can serve lookups
    pub async fn key_cache_healthy(&self) -> bool {
        match self.verifier.health_check().await {
            Ok(()) => true,
            Err(e) => {
                error!("Key cache health check failed: {}", e);
                false
            }
        }
    }
}
