use confique::Config;
use serde::Deserialize;

/// Specifies which cache store implementation holds fetched signing keys
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheStore {
    #[default]
    InMemory,
    #[serde(other)]
    None,
}

/// Configuration for the signing key cache
#[derive(Debug, Config, Clone)]
pub struct CacheConfig {
    /// Cache store type: "in-memory" (default) or "none"
    #[config(env = "DRINKS_JWKS_CACHE_STORE", default = "in-memory")]
    pub store: CacheStore,

    /// Key TTL in seconds (default: 10 minutes)
    #[config(env = "DRINKS_JWKS_CACHE_TTL", default = 600)]
    pub ttl: u64,

    /// Maximum capacity in MiB (default: 1 MiB)
    #[config(env = "DRINKS_JWKS_CACHE_CAPACITY", default = 1)]
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_store_names() {
        let store: CacheStore = serde_json::from_str("\"in-memory\"").unwrap();
        assert_eq!(store, CacheStore::InMemory);

        let store: CacheStore = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(store, CacheStore::None);
    }

    #[test]
    fn test_unknown_cache_store_disables_cache() {
        let store: CacheStore = serde_json::from_str("\"redis\"").unwrap();
        assert_eq!(store, CacheStore::None);
    }
}
