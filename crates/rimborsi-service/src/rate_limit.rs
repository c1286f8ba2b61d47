//! Request rate limiting.
//!
//! The gate only needs a yes/no verdict per key, so the limiter is a trait and
//! the service ships a simple in-process fixed-window implementation.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Number of tracked keys above which expired windows are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// A rate limiter that admits or rejects requests per key.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one request for `key`. Returns `true` if it is admitted.
    async fn limit(&self, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `limit` requests per key in each fixed window of `period`.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    limit: u32,
    period: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    /// Create a limiter admitting `limit` requests per `period` for each key.
    #[must_use]
    pub fn new(limit: u32, period: Duration) -> Self {
        Self {
            limit,
            period,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for FixedWindowLimiter {
    async fn limit(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        if windows.len() >= PRUNE_THRESHOLD {
            let period = self.period;
            windows.retain(|_, w| now.duration_since(w.started) < period);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.period {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.limit {
            return false;
        }

        window.count += 1;
        true
    }
}
