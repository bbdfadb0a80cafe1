//! Bearer token verification and per-route scope enforcement.
//!
//! A request to a protected route flows through [`middleware::require_scope`],
//! which extracts the bearer token, has [`verifier::TokenVerifier`] check it
//! against the identity provider's key set and finally compares the granted
//! scopes with the one the route requires.

pub mod claims;
pub mod errors;
pub mod jwks;
pub mod middleware;
pub mod verifier;

pub use claims::Claims;
pub use errors::AuthErrorBody;
pub use middleware::{require_scope, ScopeGate};
pub use verifier::TokenVerifier;
