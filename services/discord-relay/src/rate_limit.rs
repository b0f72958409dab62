//! Sliding-window rate limiting per client address

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use relay_wire::SendDmResponse;

use crate::config::RateLimitConfig;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Sweep idle clients once the table grows past this many entries
const SWEEP_THRESHOLD: usize = 1024;

/// Admits at most `max_requests` per client in any `window`
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    trust_proxy: bool,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, trust_proxy: bool) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_seconds),
            trust_proxy,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `client` at `now`; false when over the limit.
    /// Rejected requests still count against the window.
    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        if hits.len() > SWEEP_THRESHOLD {
            let window = self.window;
            hits.retain(|_, times| {
                times
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let times = hits.entry(client.to_string()).or_default();
        while times
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            times.pop_front();
        }
        times.push_back(now);
        // Anything past max_requests + 1 cannot change the verdict
        while times.len() > self.max_requests + 1 {
            times.pop_front();
        }
        times.len() <= self.max_requests
    }

    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// The key a request is counted under.
    ///
    /// Behind a trusted proxy this is the rightmost `X-Forwarded-For` entry,
    /// the one the proxy appended; earlier entries are client-supplied.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        if self.trust_proxy {
            let forwarded = headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.rsplit(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(client) = forwarded {
                return client.to_string();
            }
        }
        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Middleware rejecting clients over their limit with 429
pub async fn enforce(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = limiter.client_key(request.headers(), peer);

    if !limiter.check(&client) {
        tracing::warn!("Rate limit exceeded for {}", client);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(SendDmResponse::error(RATE_LIMIT_MESSAGE)),
        )
            .into_response();
    }

    next.run(request).await
}
