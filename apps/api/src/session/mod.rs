//! Session and ownership gate: who is calling, and therefore who owns what they create.
//!
//! The gate itself is a synchronous query (`SessionGate`). Resolving a bearer token
//! into an identity is async and happens once per request in the `CallerSession`
//! extractor; nothing caches the identity beyond that request.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;

/// Opaque identity of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(pub Uuid);

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Answers "who is the current caller?". `None` means no session.
pub trait SessionGate: Send + Sync {
    fn current_caller_id(&self) -> Option<CallerId>;
}

// ────────────────────────────────────────────────────────────────────────────
// Per-request session
// ────────────────────────────────────────────────────────────────────────────

/// The session attached to one HTTP request.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerSession {
    caller: Option<CallerId>,
}

impl CallerSession {
    pub fn anonymous() -> Self {
        Self { caller: None }
    }

    pub fn authenticated(caller: CallerId) -> Self {
        Self {
            caller: Some(caller),
        }
    }
}

impl SessionGate for CallerSession {
    fn current_caller_id(&self) -> Option<CallerId> {
        self.caller
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CallerSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let Some(token) = bearer_token(parts) else {
            return Ok(CallerSession::anonymous());
        };

        match state.sessions.resolve(token).await? {
            Some(caller) => Ok(CallerSession::authenticated(caller)),
            None => {
                debug!("Bearer token did not resolve to a session");
                Ok(CallerSession::anonymous())
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Token resolvers
// ────────────────────────────────────────────────────────────────────────────

/// Maps a bearer token to a caller identity. Unknown tokens resolve to `None`.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Option<CallerId>, AppError>;
}

/// Looks tokens up in the `sessions` table, ignoring expired rows.
pub struct PgSessionResolver {
    pool: PgPool,
}

impl PgSessionResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionResolver for PgSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<CallerId>, AppError> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Session lookup failed: {e}");
            AppError::Fetch("Could not verify your session".to_string())
        })?;

        Ok(user_id.map(CallerId))
    }
}

/// Fixed token table, configured through `SESSION_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct StaticSessionResolver {
    tokens: HashMap<String, CallerId>,
}

impl StaticSessionResolver {
    pub fn new(tokens: HashMap<String, CallerId>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl SessionResolver for StaticSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<CallerId>, AppError> {
        Ok(self.tokens.get(token).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/history");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_extracted() {
        let parts = parts_with_auth(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_empty_bearer_ignored() {
        let parts = parts_with_auth(Some("Bearer   "));
        assert_eq!(bearer_token(&parts), None);
        assert_eq!(bearer_token(&parts_with_auth(None)), None);
    }

    #[test]
    fn test_gate_reports_caller() {
        let caller = CallerId(Uuid::new_v4());
        assert_eq!(
            CallerSession::authenticated(caller).current_caller_id(),
            Some(caller)
        );
        assert_eq!(CallerSession::anonymous().current_caller_id(), None);
    }

    #[tokio::test]
    async fn test_static_resolver_known_and_unknown_tokens() {
        let caller = CallerId(Uuid::new_v4());
        let resolver =
            StaticSessionResolver::new(HashMap::from([("tok-1".to_string(), caller)]));

        assert_eq!(resolver.resolve("tok-1").await.unwrap(), Some(caller));
        assert_eq!(resolver.resolve("tok-2").await.unwrap(), None);
    }
}
