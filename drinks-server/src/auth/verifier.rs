use super::claims::Claims;
use super::errors::AuthError;
use super::jwks::{JwksClient, JwksError};
use crate::cache::Cache;
use crate::config::AuthConfig;
use http::HeaderValue;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use log::{debug, error};

/// Validates bearer tokens against the identity provider's key set
pub struct TokenVerifier {
    jwks: JwksClient,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, cache: Cache) -> Result<Self, String> {
        let algorithm = config.algorithm()?;
        let jwks = JwksClient::new(config.jwks_url()?, config.jwks_timeout(), cache)
            .map_err(|e| format!("Failed to create JWKS client: {e}"))?;

        let mut validation = Validation::new(algorithm);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_issuer(&[config.issuer()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.leeway = config.leeway;

        Ok(Self {
            jwks,
            algorithm,
            validation,
        })
    }

    /// Extracts the token from an `Authorization: Bearer <token>` header
    pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let value = header
            .to_str()
            .map_err(|_| AuthError::invalid_header("Authorization header is not valid text."))?;

        let parts: Vec<&str> = value.split_whitespace().collect();
        match parts.as_slice() {
            [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => Ok(*token),
            [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(
                AuthError::invalid_header("Authorization header must start with \"Bearer\"."),
            ),
            [] | [_] => Err(AuthError::invalid_header("Token not found.")),
            _ => Err(AuthError::invalid_header(
                "Authorization header must be bearer token.",
            )),
        }
    }

    pub async fn health_check(&self) -> Result<(), String> {
        self.jwks.health_check().await
    }

    /// Verifies signature and standard claims, returning the decoded payload
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header =
            decode_header(token).map_err(|_| AuthError::invalid_header("Authorization malformed."))?;

        if header.alg != self.algorithm {
            return Err(AuthError::invalid_header(
                "Token is signed with an unsupported algorithm.",
            ));
        }
        let kid = header
            .kid
            .ok_or_else(|| AuthError::invalid_header("Authorization malformed."))?;

        let jwk = match self.jwks.key(&kid).await {
            Ok(jwk) => jwk,
            Err(JwksError::NoMatchingKey(_)) => {
                return Err(AuthError::invalid_header(
                    "Unable to find the appropriate key.",
                ))
            }
            Err(e) => {
                error!("Failed to retrieve signing key '{}': {}", kid, e);
                return Err(AuthError::KeySetUnavailable);
            }
        };

        let key = decoding_key(&jwk)?;
        let data = decode::<Claims>(token, &key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidAudience
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_) => AuthError::invalid_claims(
                    "Incorrect claims. Please, check the audience and issuer.",
                ),
                _ => AuthError::invalid_header("Unable to parse authentication token."),
            }
        })?;

        Ok(data.claims)
    }
}

fn decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    let key = match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e),
        _ => DecodingKey::from_jwk(jwk),
    };
    key.map_err(|e| {
        error!("Signing key from the key set is unusable: {}", e);
        AuthError::invalid_header("Unable to find the appropriate key.")
    })
}
