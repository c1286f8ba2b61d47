//! Authentication gate and extractor.
//!
//! Every API request passes through [`AuthGate::admit`] before anything else
//! runs:
//!
//! 1. The caller is fingerprinted from the address the edge proxy vouches
//!    for, falling back to the socket peer.
//! 2. A caller whose previous attempt failed is throttled by the strict
//!    limiter, shared by all such callers; anyone else by the normal limiter
//!    keyed on the fingerprint.
//! 3. The bearer token is compared in constant time.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::rate_limit::RateLimiter;
use crate::state::AppState;

// ============================================================================
// Constants
// ============================================================================

/// Limiter key shared by every caller on the strict tier.
const STRICT_LIMIT_KEY: &str = "failed-auth";

/// Caller identity used when neither a proxy header nor the peer address is
/// available.
const UNKNOWN_CALLER: &str = "unknown";

/// Failure markers kept before the set is reset.
const MAX_TRACKED_FAILURES: usize = 10_000;

/// Rate limiting plus shared-secret check.
pub struct AuthGate {
    token: String,
    limiter: Arc<dyn RateLimiter>,
    strict_limiter: Arc<dyn RateLimiter>,
    failed_callers: RwLock<HashSet<String>>,
}

impl AuthGate {
    /// Create a gate expecting `token`, throttled by the two limiters.
    pub fn new(
        token: impl Into<String>,
        limiter: Arc<dyn RateLimiter>,
        strict_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            token: token.into(),
            limiter,
            strict_limiter,
            failed_callers: RwLock::new(HashSet::new()),
        }
    }

    /// Admit or reject a request based on its headers and socket peer.
    ///
    /// # Errors
    ///
    /// - `ApiError::TooManyRequests` if the applicable limiter rejects the
    ///   caller. The token is not checked in that case.
    /// - `ApiError::Unauthorized` if the token is missing or wrong.
    pub async fn admit(
        &self,
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
    ) -> Result<(), ApiError> {
        let caller = caller_key(headers, peer);
        let failed_before = self.failed_callers.read().await.contains(&caller);

        let allowed = if failed_before {
            self.strict_limiter.limit(STRICT_LIMIT_KEY).await
        } else {
            self.limiter.limit(&caller).await
        };

        if !allowed {
            tracing::warn!(caller = %caller, strict = failed_before, "Rate limit exceeded");
            return Err(ApiError::TooManyRequests);
        }

        if self.token_matches(headers) {
            if failed_before {
                self.failed_callers.write().await.remove(&caller);
            }
            return Ok(());
        }

        tracing::warn!(caller = %caller, "Rejected request with missing or wrong token");
        let mut failed = self.failed_callers.write().await;
        if failed.len() >= MAX_TRACKED_FAILURES {
            failed.clear();
        }
        failed.insert(caller);

        Err(ApiError::Unauthorized)
    }

    fn token_matches(&self, headers: &HeaderMap) -> bool {
        if self.token.is_empty() {
            return false;
        }

        let Some(presented) = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.strip_prefix("Bearer ").unwrap_or(v).trim())
        else {
            return false;
        };

        presented.as_bytes().ct_eq(self.token.as_bytes()).into()
    }
}

/// SHA-256 hex of the caller's address.
///
/// `CF-Connecting-IP` is set by the edge and cannot be supplied by the client.
/// Proxies append to `X-Forwarded-For`, so only its last hop is trusted; the
/// leading hops are whatever the client sent. Without either header the
/// socket peer is used.
#[must_use]
pub fn caller_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let identity = header("cf-connecting-ip")
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.rsplit(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_owned());

    hex::encode(Sha256::digest(identity.as_bytes()))
}

/// Proof that the request passed the [`AuthGate`].
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        state.auth.admit(&parts.headers, peer).await?;
        Ok(Authorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::FixedWindowLimiter;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn gate(normal: u32, strict: u32) -> AuthGate {
        AuthGate::new(
            "secret",
            Arc::new(FixedWindowLimiter::new(normal, Duration::from_secs(60))),
            Arc::new(FixedWindowLimiter::new(strict, Duration::from_secs(10))),
        )
    }

    fn headers(ip: &str, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_str(ip).unwrap());
        if let Some(token) = token {
            headers.insert(AUTHORIZATION, HeaderValue::from_str(token).unwrap());
        }
        headers
    }

    fn digest(identity: &str) -> String {
        hex::encode(Sha256::digest(identity.as_bytes()))
    }

    #[test]
    fn caller_key_prefers_edge_header() {
        let mut h = HeaderMap::new();
        h.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
        );
        h.insert("cf-connecting-ip", HeaderValue::from_static("5.6.7.8"));

        assert_eq!(caller_key(&h, None), digest("5.6.7.8"));
    }

    #[test]
    fn caller_key_uses_last_forwarded_hop() {
        let mut h = HeaderMap::new();
        h.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
        );

        assert_eq!(caller_key(&h, None), digest("10.0.0.1"));
    }

    #[test]
    fn caller_key_falls_back_to_peer() {
        let peer: SocketAddr = "192.0.2.9:5123".parse().unwrap();

        assert_eq!(caller_key(&HeaderMap::new(), Some(peer)), digest("192.0.2.9"));
        assert_eq!(caller_key(&HeaderMap::new(), None), digest("unknown"));
    }

    #[tokio::test]
    async fn rotating_forwarded_prefix_stays_on_strict_tier() {
        let gate = gate(60, 1);

        let attempt = |spoofed: usize| {
            let mut h = HeaderMap::new();
            h.insert(
                "x-forwarded-for",
                HeaderValue::from_str(&format!("10.0.{}.{}", spoofed / 256, spoofed % 256))
                    .unwrap(),
            );
            h.insert("cf-connecting-ip", HeaderValue::from_static("9.9.9.9"));
            h.insert(AUTHORIZATION, HeaderValue::from_static("wrong"));
            h
        };

        assert!(matches!(
            gate.admit(&attempt(0), None).await,
            Err(ApiError::Unauthorized)
        ));
        // One strict slot per window.
        assert!(matches!(
            gate.admit(&attempt(1), None).await,
            Err(ApiError::Unauthorized)
        ));

        let mut throttled = 0;
        for spoofed in 2..200 {
            if matches!(
                gate.admit(&attempt(spoofed), None).await,
                Err(ApiError::TooManyRequests)
            ) {
                throttled += 1;
            }
        }
        assert_eq!(throttled, 198);
    }

    #[tokio::test]
    async fn peers_without_proxy_headers_are_told_apart() {
        let gate = gate(60, 1);
        let attacker: SocketAddr = "192.0.2.1:4000".parse().unwrap();
        let user: SocketAddr = "192.0.2.2:4000".parse().unwrap();

        let mut wrong = HeaderMap::new();
        wrong.insert(AUTHORIZATION, HeaderValue::from_static("wrong"));
        let mut right = HeaderMap::new();
        right.insert(AUTHORIZATION, HeaderValue::from_static("secret"));

        assert!(gate.admit(&wrong, Some(attacker)).await.is_err());
        assert!(gate.admit(&right, Some(user)).await.is_ok());

        // The user's success did not clear the attacker's failure marker.
        assert!(gate.admit(&wrong, Some(attacker)).await.is_err());
        assert!(matches!(
            gate.admit(&wrong, Some(attacker)).await,
            Err(ApiError::TooManyRequests)
        ));
    }

    #[tokio::test]
    async fn accepts_bearer_and_bare_token() {
        let gate = gate(10, 10);
        assert!(gate.admit(&headers("1.1.1.1", Some("Bearer secret")), None).await.is_ok());
        assert!(gate.admit(&headers("1.1.1.1", Some("secret")), None).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_missing_and_wrong_token() {
        let gate = gate(10, 10);
        assert!(matches!(
            gate.admit(&headers("1.1.1.1", None), None).await,
            Err(ApiError::Unauthorized)
        ));
        assert!(matches!(
            gate.admit(&headers("2.2.2.2", Some("Bearer nope")), None).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn failed_caller_moves_to_strict_tier() {
        let gate = gate(10, 1);

        assert!(gate.admit(&headers("1.1.1.1", Some("wrong")), None).await.is_err());

        // First strict slot is used by the retry, which succeeds.
        assert!(gate.admit(&headers("1.1.1.1", Some("secret")), None).await.is_ok());

        // Back on the normal tier after success.
        assert!(gate.admit(&headers("1.1.1.1", Some("secret")), None).await.is_ok());
    }

    #[tokio::test]
    async fn strict_tier_is_shared_and_checked_before_token() {
        let gate = gate(10, 1);

        assert!(gate.admit(&headers("1.1.1.1", Some("wrong")), None).await.is_err());
        assert!(gate.admit(&headers("2.2.2.2", Some("wrong")), None).await.is_err());

        // Caller 1 consumes the single strict slot.
        assert!(matches!(
            gate.admit(&headers("1.1.1.1", Some("wrong")), None).await,
            Err(ApiError::Unauthorized)
        ));
        // Caller 2 shares the same strict key, so even the right token is throttled.
        assert!(matches!(
            gate.admit(&headers("2.2.2.2", Some("secret")), None).await,
            Err(ApiError::TooManyRequests)
        ));
    }

    #[tokio::test]
    async fn normal_tier_throttles_per_caller() {
        let gate = gate(1, 1);

        assert!(gate.admit(&headers("1.1.1.1", Some("secret")), None).await.is_ok());
        assert!(matches!(
            gate.admit(&headers("1.1.1.1", Some("secret")), None).await,
            Err(ApiError::TooManyRequests)
        ));
        assert!(gate.admit(&headers("2.2.2.2", Some("secret")), None).await.is_ok());
    }

    #[tokio::test]
    async fn empty_configured_token_rejects_everything() {
        let gate = AuthGate::new(
            "",
            Arc::new(FixedWindowLimiter::new(10, Duration::from_secs(60))),
            Arc::new(FixedWindowLimiter::new(10, Duration::from_secs(10))),
        );
        assert!(gate.admit(&headers("1.1.1.1", Some("")), None).await.is_err());
    }
}
