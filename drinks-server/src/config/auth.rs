//! Identity provider configuration

use confique::Config;
use jsonwebtoken::Algorithm;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Configuration for validating bearer tokens issued by the identity provider
#[derive(Debug, Config, Clone)]
pub struct AuthConfig {
    /// Identity provider domain, e.g. `example.us.auth0.com`
    #[config(env = "DRINKS_AUTH_DOMAIN")]
    pub domain: String,

    /// API identifier tokens must be issued for
    #[config(env = "DRINKS_AUTH_AUDIENCE")]
    pub audience: String,

    /// Signing algorithm accepted for tokens (default: RS256)
    #[config(env = "DRINKS_AUTH_ALGORITHM", default = "RS256")]
    pub algorithm: String,

    /// Overrides the key set location derived from the domain
    #[config(env = "DRINKS_AUTH_JWKS_URL")]
    pub jwks_url: Option<String>,

    /// Timeout for fetching the key set in seconds (default: 5)
    #[config(env = "DRINKS_AUTH_JWKS_TIMEOUT", default = 5)]
    pub jwks_timeout: u64,

    /// Clock skew tolerated when checking `exp` in seconds (default: 0)
    #[config(env = "DRINKS_AUTH_LEEWAY", default = 0)]
    pub leeway: u64,
}

impl AuthConfig {
    /// The `iss` claim expected on every token
    pub fn issuer(&self) -> String {
        format!("https://{}/", self.domain.trim_end_matches('/'))
    }

    /// Location of the published key set
    pub fn jwks_url(&self) -> Result<Url, String> {
        let raw = match &self.jwks_url {
            Some(url) => url.clone(),
            None => format!(
                "https://{}/.well-known/jwks.json",
                self.domain.trim_end_matches('/')
            ),
        };
        Url::parse(&raw).map_err(|e| format!("Invalid JWKS URL '{raw}': {e}"))
    }

    pub fn jwks_timeout(&self) -> Duration {
        Duration::from_secs(self.jwks_timeout)
    }

    /// Parses the configured algorithm, refusing anything that is not asymmetric
    pub fn algorithm(&self) -> Result<Algorithm, String> {
        let algorithm = Algorithm::from_str(self.algorithm.trim())
            .map_err(|_| format!("Unknown signing algorithm '{}'", self.algorithm))?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(format!(
                "Signing algorithm '{}' is symmetric, an asymmetric algorithm is required",
                self.algorithm
            )),
            other => Ok(other),
        }
    }
}
