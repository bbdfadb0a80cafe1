use super::{CacheBackend, CacheError};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Cache that never stores anything, so every key lookup refetches the key set
#[derive(Clone, Debug, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        NullCache
    }
}

#[async_trait]
impl CacheBackend for NullCache {
    async fn set<T: Serialize + Send + Sync>(
        &self,
        _key: &str,
        _value: &T,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn get<T: DeserializeOwned + Send + Sync>(
        &self,
        _key: &str,
    ) -> Result<Option<T>, CacheError> {
        Ok(None)
    }

    async fn health_check(&self) -> Result<(), String> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_never_returns_values() {
        let cache = NullCache::new();

        cache.set("jwks:abc", &"key material").await.unwrap();
        let result: Option<String> = cache.get("jwks:abc").await.unwrap();
        assert!(result.is_none());

        assert!(cache.delete("jwks:abc").await.is_ok());
        assert!(cache.health_check().await.is_ok());
    }
}
