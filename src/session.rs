//! Session transport abstraction.
//!
//! The authorization gate only needs get/set/clear of an opaque session
//! token; the concrete transport (cookies here) can be swapped without
//! touching any access-control code.

use crate::config::SessionConfig;
use axum::http::{HeaderMap, HeaderValue};

pub trait SessionTransport: Send + Sync {
    /// Extract the session token from an incoming request, if present.
    fn get(&self, headers: &HeaderMap) -> Option<String>;

    /// Header value that installs `token` on the client.
    fn set(&self, token: &str) -> HeaderValue;

    /// Header value that removes the session from the client.
    fn clear(&self) -> HeaderValue;
}

/// Cookie-backed session transport (HttpOnly, SameSite=Lax).
pub struct CookieTransport {
    cookie_name: String,
    max_age_secs: i64,
}

impl CookieTransport {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            max_age_secs: config.ttl_hours * 3600,
        }
    }
}

impl SessionTransport for CookieTransport {
    fn get(&self, headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get("cookie")?.to_str().ok()?;

        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == self.cookie_name && !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }

        None
    }

    fn set(&self, token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, token, self.max_age_secs
        ))
        .unwrap()
    }

    fn clear(&self) -> HeaderValue {
        HeaderValue::from_str(&format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.cookie_name
        ))
        .unwrap()
    }
}
