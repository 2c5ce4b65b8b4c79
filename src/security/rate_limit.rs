//! Rate Limiting Module
//!
//! Sliding-window limiter keyed by client, used to cap OTP sends per phone
//! number and OTP checks per user. Each check sweeps idle clients.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rate limit result
#[derive(Debug, Clone, PartialEq)]
pub enum RateLimitResult {
    Allowed {
        /// Requests left in the current window
        remaining: u32,
    },
    Limited {
        /// Seconds until the oldest request leaves the window
        retry_after: u64,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Client identifier for rate limiting
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum RateLimitClient {
    Phone(String),
    User(String),
}

impl RateLimitClient {
    pub fn key(&self) -> String {
        match self {
            RateLimitClient::Phone(phone) => format!("phone:{}", phone),
            RateLimitClient::User(id) => format!("user:{}", id),
        }
    }
}

/// In-memory rate limiter using sliding window
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    /// Request history (client -> timestamps)
    request_history: Arc<RwLock<HashMap<String, Vec<DateTime<Utc>>>>>,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            request_history: Arc::new(RwLock::new(HashMap::new())),
            enabled: max_requests > 0,
        }
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::hours(1))
    }

    /// Limiter that allows everything
    pub fn disabled() -> Self {
        Self::new(0, Duration::hours(1))
    }

    /// Check and, when allowed, record a request.
    pub async fn check_rate_limit(
        &self,
        client: &RateLimitClient,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        if !self.enabled {
            return RateLimitResult::Allowed {
                remaining: u32::MAX,
            };
        }

        let cutoff = now - self.window;
        let mut history = self.request_history.write().await;
        prune(&mut history, cutoff);
        let requests = history.entry(client.key()).or_default();

        if requests.len() >= self.max_requests as usize {
            let oldest = requests.iter().min().copied().unwrap_or(now);
            let retry_after = (oldest + self.window - now).num_seconds().max(1) as u64;
            return RateLimitResult::Limited { retry_after };
        }

        requests.push(now);
        RateLimitResult::Allowed {
            remaining: self.max_requests - requests.len() as u32,
        }
    }

    /// Drop clients with no request inside the window.
    pub async fn cleanup(&self, now: DateTime<Utc>) {
        let mut history = self.request_history.write().await;
        prune(&mut history, now - self.window);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.request_history.read().await.len()
    }
}

/// Forget requests at or before `cutoff` and clients left with none.
fn prune(history: &mut HashMap<String, Vec<DateTime<Utc>>>, cutoff: DateTime<Utc>) {
    history.retain(|_, requests| {
        requests.retain(|t| *t > cutoff);
        !requests.is_empty()
    });
}
