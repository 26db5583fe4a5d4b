//! Per-client request rate limiting for the HTTP API
//!
//! Fixed window counter keyed by the peer IP of the connection. The first
//! `X-Forwarded-For` entry is only consulted when no peer address is known.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, Response, StatusCode},
    middleware::Next,
    response::IntoResponse,
    Json,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::api::ApiResponse;
use crate::config::RateLimitConfig;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Rate limiter state
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of client key to (request count, window start)
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, config.window)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        match requests.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_requests {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                requests.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Drop windows that can no longer limit anyone
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.requests.read().await.len()
    }
}

/// Periodically prune stale windows
pub fn spawn_cleanup(limiter: RateLimiter) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window().max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            limiter.cleanup().await;
            let clients = limiter.tracked_clients().await;
            tracing::debug!(clients, "Rate limiter cleanup");
        }
    });
}

fn client_key(request: &Request<Body>) -> Option<String> {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(format!("ip:{}", addr.ip()));
    }

    request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|ip| format!("ip:{}", ip))
}

fn rate_limited(window: Duration) -> Response<Body> {
    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ApiResponse::<()>::failure(
            "Too many requests, please try again later.",
        )),
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&window.as_secs().to_string()) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    // Requests we can't attribute to a client are let through
    if let Some(key) = client_key(&request) {
        if !limiter.check(&key).await {
            tracing::warn!(key, uri = %request.uri(), "Rate limited");
            return rate_limited(limiter.window());
        }
    }

    next.run(request).await
}
