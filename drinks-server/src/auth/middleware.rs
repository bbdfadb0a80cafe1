use super::claims::Claims;
use super::errors::AuthError;
use super::verifier::TokenVerifier;
use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use log::warn;
use std::sync::Arc;

/// State of the scope checking middleware: the verifier plus the scope one route requires
#[derive(Clone)]
pub struct ScopeGate {
    verifier: Arc<TokenVerifier>,
    scope: &'static str,
}

impl ScopeGate {
    pub fn new(verifier: Arc<TokenVerifier>, scope: &'static str) -> Self {
        Self { verifier, scope }
    }
}

/// Admits the request only when it carries a valid token granting the gate's scope.
///
/// The verified [`Claims`] are stored in the request extensions for the handler.
pub async fn require_scope(
    State(gate): State<ScopeGate>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = TokenVerifier::bearer_token(request.headers().get(http::header::AUTHORIZATION))
        .inspect_err(|e| warn!("Rejected request for '{}': {}", gate.scope, e))?;

    let claims = gate
        .verifier
        .verify(token)
        .await
        .inspect_err(|e| warn!("Rejected token for '{}': {}", gate.scope, e))?;

    check_scope(&claims, gate.scope).inspect_err(|e| {
        warn!(
            "Subject '{}' rejected for '{}': {}",
            claims.subject(),
            gate.scope,
            e
        )
    })?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Checks that the claims grant `scope`
pub fn check_scope(claims: &Claims, scope: &str) -> Result<(), AuthError> {
    let scopes = claims.scopes().ok_or(AuthError::MissingScopeClaim)?;
    if scopes.contains(scope) {
        Ok(())
    } else {
        Err(AuthError::InsufficientScope(scope.to_string()))
    }
}
