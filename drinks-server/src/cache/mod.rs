use crate::config::{CacheConfig, CacheStore};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod memory;
pub mod null;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to serialize value: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Failed to parse value: {0}")]
    Deserialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Interface shared by all cache backends.
///
/// Values are stored serialized, so anything `Serialize + DeserializeOwned`
/// can be cached under a string key.
#[async_trait::async_trait]
pub trait CacheBackend: Send + Sync {
    /// Store a value in the cache with the configured TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T)
        -> Result<(), CacheError>;

    /// Retrieve a value from the cache
    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError>;

    /// Returns Ok(()) if the backend can serve requests
    async fn health_check(&self) -> Result<(), String>;

    /// Delete a value from the cache
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// Cache backend chosen at startup from the configuration
#[derive(Clone)]
pub enum Cache {
    /// In-memory cache implementation using Moka
    InMemory(memory::InMemoryCache),
    /// No-op cache implementation that doesn't actually cache anything
    Null(null::NullCache),
}

#[async_trait::async_trait]
impl CacheBackend for Cache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.set(key, value).await,
            Self::Null(cache) => cache.set(key, value).await,
        }
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<T>, CacheError> {
        match self {
            Self::InMemory(cache) => cache.get(key).await,
            Self::Null(cache) => cache.get(key).await,
        }
    }

    async fn health_check(&self) -> Result<(), String> {
        match self {
            Self::InMemory(cache) => cache.health_check().await,
            Self::Null(cache) => cache.health_check().await,
        }
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            Self::InMemory(cache) => cache.delete(key).await,
            Self::Null(cache) => cache.delete(key).await,
        }
    }
}

/// Creates the cache implementation selected by `config.store`
pub fn create_cache(config: &CacheConfig) -> Result<Cache, CacheError> {
    match config.store {
        CacheStore::InMemory => {
            let cache = memory::InMemoryCache::new(config.ttl, config.capacity)
                .map_err(CacheError::Config)?;
            Ok(Cache::InMemory(cache))
        }
        CacheStore::None => Ok(Cache::Null(null::NullCache::new())),
    }
}
