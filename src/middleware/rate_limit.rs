//! Sliding-window rate limiting, keyed by client address.
//!
//! Each key owns an ordered list of recent request instants. The admission
//! check and the periodic sweep both mutate the same map, so both go
//! through the single lock.

use crate::error::Error;
use crate::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use tracing::{debug, warn};

pub struct RateLimiter {
    limit: usize,
    window: Duration,
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Admit or reject a request from `key`. Entries older than the window
    /// are pruned first; the pruned list is kept even on rejection so the
    /// window keeps sliding.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();

        let timestamps = requests.entry(key.to_string()).or_default();
        timestamps.retain(|&t| now.duration_since(t) <= self.window);

        if timestamps.len() >= self.limit {
            return false;
        }

        timestamps.push(now);
        true
    }

    /// Drop aged-out entries everywhere and forget keys that go empty.
    /// Bounds memory growth for clients that stop sending requests.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| now.duration_since(t) <= self.window);
            !timestamps.is_empty()
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Background sweep, firing once per window for the life of the
    /// process.
    pub fn spawn_sweeper(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(limiter.window);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                limiter.prune();
                debug!("Rate limiter sweep done, {} keys tracked", limiter.tracked_keys());
            }
        });
    }
}

/// Client key for rate limiting: first X-Forwarded-For entry, else
/// X-Real-IP, else the peer address without its port.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => "unknown".to_string(),
    }
}

pub async fn limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);

    if !state.rate_limiter.allow(&key) {
        warn!("Rate limit exceeded for {}", key);
        return Error::RateLimited {
            retry_after_secs: state.rate_limiter.window().as_secs(),
        }
        .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::thread::sleep;

    #[test]
    fn allows_exactly_limit_requests_per_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        assert!(limiter.allow("ip1"));
        assert!(limiter.allow("ip1"));
        assert!(!limiter.allow("ip1"));
    }

    #[test]
    fn requests_age_out_of_the_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.allow("ip1"));
        assert!(limiter.allow("ip1"));
        assert!(!limiter.allow("ip1"));

        sleep(Duration::from_millis(60));
        assert!(limiter.allow("ip1"));
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = RateLimiter::new(1, Duration::from_secs(1));

        assert!(limiter.allow("ip1"));
        assert!(!limiter.allow("ip1"));
        assert!(limiter.allow("ip2"));
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.allow("ip1"));
        // Hammering while limited must not keep the key saturated forever.
        assert!(!limiter.allow("ip1"));
        sleep(Duration::from_millis(30));
        assert!(!limiter.allow("ip1"));
        sleep(Duration::from_millis(30));
        assert!(limiter.allow("ip1"));
    }

    #[test]
    fn prune_forgets_idle_keys() {
        let limiter = RateLimiter::new(5, Duration::from_millis(20));

        assert!(limiter.allow("ip1"));
        assert!(limiter.allow("ip2"));
        assert_eq!(limiter.tracked_keys(), 2);

        sleep(Duration::from_millis(30));
        limiter.prune();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        let peer: SocketAddr = "192.0.2.1:5000".parse().unwrap();

        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.7");

        headers.remove("x-forwarded-for");
        assert_eq!(client_key(&headers, Some(peer)), "198.51.100.2");

        headers.remove("x-real-ip");
        // Peer address is used with the port stripped.
        assert_eq!(client_key(&headers, Some(peer)), "192.0.2.1");

        assert_eq!(client_key(&headers, None), "unknown");
    }
}
