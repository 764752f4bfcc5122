//! Authentication context: turns a bearer token into a [`Principal`].

use std::collections::HashMap;

use axum::http::HeaderMap;
use common::UserId;
use domain::Principal;
use thiserror::Error;

/// Reasons a request could not be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No authorization token was found")]
    MissingToken,

    #[error("Format is Authorization: Bearer [token]")]
    BadScheme,

    #[error("invalid token")]
    InvalidToken,
}

impl AuthError {
    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "credentials_required",
            AuthError::BadScheme => "credentials_bad_scheme",
            AuthError::InvalidToken => "invalid_token",
        }
    }
}

/// Resolves bearer tokens to principals.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Principal, AuthError>;
}

/// Authenticator backed by a fixed token table.
#[derive(Debug, Clone, Default)]
pub struct TokenAuthenticator {
    tokens: HashMap<String, Principal>,
}

impl TokenAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants `token` the identity of `principal`.
    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    /// Parses `token=user_uuid:name` entries separated by commas.
    ///
    /// Malformed entries are skipped with a warning.
    pub fn from_grants(grants: &str) -> Self {
        let mut auth = Self::new();
        for entry in grants.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match parse_grant(entry) {
                Some((token, principal)) => auth = auth.with_token(token, principal),
                None => tracing::warn!(entry, "ignoring malformed token grant"),
            }
        }
        auth
    }

    pub fn principals(&self) -> impl Iterator<Item = &Principal> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authenticator for TokenAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Principal, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

fn parse_grant(entry: &str) -> Option<(String, Principal)> {
    let (token, identity) = entry.split_once('=')?;
    let (user, name) = match identity.split_once(':') {
        Some((user, name)) => (user, Some(name)),
        None => (identity, None),
    };
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let principal = Principal::new(UserId::parse(user).ok()?);
    let principal = match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => principal.with_name(name),
        None => principal,
    };
    Some((token.to_string(), principal))
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?;

    let header = header.to_str().map_err(|_| AuthError::BadScheme)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::BadScheme)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::BadScheme);
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_header_and_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingToken));

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), Err(AuthError::BadScheme));

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), Err(AuthError::BadScheme));

        headers.insert("authorization", HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(bearer_token(&headers), Ok("tok-1"));
    }

    #[test]
    fn token_table_resolves_known_tokens_only() {
        let id = UserId::new();
        let auth = TokenAuthenticator::new().with_token("secret", Principal::new(id));

        assert_eq!(auth.authenticate("secret").unwrap().id(), id);
        assert_eq!(auth.authenticate("other"), Err(AuthError::InvalidToken));
    }

    #[test]
    fn grants_parse_with_and_without_names() {
        let ada = UserId::new();
        let bob = UserId::new();
        let auth = TokenAuthenticator::from_grants(&format!("t1={ada}:Ada, t2={bob}"));

        assert_eq!(auth.len(), 2);
        let p1 = auth.authenticate("t1").unwrap();
        assert_eq!(p1.id(), ada);
        assert_eq!(p1.name(), Some("Ada"));
        assert_eq!(auth.authenticate("t2").unwrap().name(), None);
    }

    #[test]
    fn malformed_grants_are_skipped() {
        let auth = TokenAuthenticator::from_grants("no-equals, =abc, t3=not-a-uuid:X,,");
        assert!(auth.is_empty());
    }
}
