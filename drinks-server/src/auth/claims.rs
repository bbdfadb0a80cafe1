use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The `aud` claim may be a single value or a list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

/// Decoded payload of a verified access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
    pub iss: String,
    pub aud: Audience,
    /// Space delimited scopes
    #[serde(default)]
    pub scope: Option<String>,
    /// RBAC permissions some identity providers emit instead of `scope`
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

impl Claims {
    /// Granted scopes, `None` when the token carries neither `scope` nor `permissions`
    pub fn scopes(&self) -> Option<BTreeSet<String>> {
        if self.scope.is_none() && self.permissions.is_none() {
            return None;
        }

        let from_scope = self
            .scope
            .iter()
            .flat_map(|scope| scope.split_whitespace())
            .map(str::to_string);
        let from_permissions = self.permissions.iter().flatten().cloned();
        Some(from_scope.chain(from_permissions).collect())
    }

    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("<unknown>")
    }
}
