//! Retrieval of the identity provider's published signing keys

use crate::cache::{Cache, CacheBackend};
use jsonwebtoken::jwk::{Jwk, JwkSet};
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use url::Url;

/// How long a `kid` absent from the published set is refused without refetching
const UNKNOWN_KID_RETRY: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("Failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Key set endpoint answered with status {0}")]
    Status(StatusCode),
    #[error("No key with id '{0}' in the key set")]
    NoMatchingKey(String),
}

/// Looks up signing keys by `kid`, caching every key of each fetched set
#[derive(Clone)]
pub struct JwksClient {
    client: Client,
    url: Url,
    cache: Cache,
}

impl JwksClient {
    pub fn new(url: Url, timeout: Duration, cache: Cache) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self { client, url, cache })
    }

    /// Returns the key with the given id, refetching the set on a cache miss
    pub async fn key(&self, kid: &str) -> Result<Jwk, JwksError> {
        let cache_key = Self::cache_key(kid);
        match self.cache.get::<Jwk>(&cache_key).await {
            Ok(Some(jwk)) => return Ok(jwk),
            Ok(None) => {}
            Err(e) => {
                warn!("Dropping unreadable cached key '{}': {}", kid, e);
                if let Err(e) = self.cache.delete(&cache_key).await {
                    warn!("Failed to delete cached key '{}': {}", kid, e);
                }
            }
        }

        if self.recently_missing(kid).await {
            debug!("Key '{}' was missing from the last fetched set", kid);
            return Err(JwksError::NoMatchingKey(kid.to_string()));
        }

        let key_set = self.fetch().await?;
        let mut matching = None;
        for jwk in key_set.keys {
            let Some(id) = jwk.common.key_id.clone() else {
                continue;
            };
            if let Err(e) = self.cache.set(&Self::cache_key(&id), &jwk).await {
                warn!("Failed to cache key '{}': {}", id, e);
            }
            if id == kid {
                matching = Some(jwk);
            }
        }

        match matching {
            Some(jwk) => Ok(jwk),
            None => {
                self.remember_missing(kid).await;
                Err(JwksError::NoMatchingKey(kid.to_string()))
            }
        }
    }

    async fn recently_missing(&self, kid: &str) -> bool {
        match self.cache.get::<u64>(&Self::missing_key(kid)).await {
            Ok(Some(missed_at)) => {
                unix_now().saturating_sub(missed_at) < UNKNOWN_KID_RETRY.as_secs()
            }
            _ => false,
        }
    }

    async fn remember_missing(&self, kid: &str) {
        if let Err(e) = self.cache.set(&Self::missing_key(kid), &unix_now()).await {
            warn!("Failed to remember missing key '{}': {}", kid, e);
        }
    }

    /// Reports whether the key cache can serve lookups
    pub async fn health_check(&self) -> Result<(), String> {
        self.cache.health_check().await
    }

    async fn fetch(&self) -> Result<JwkSet, JwksError> {
        debug!("Fetching signing keys from {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(JwksError::Status(response.status()));
        }
        Ok(response.json::<JwkSet>().await?)
    }

    fn cache_key(kid: &str) -> String {
        format!("jwks:{kid}")
    }

    fn missing_key(kid: &str) -> String {
        format!("jwks-missing:{kid}")
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
