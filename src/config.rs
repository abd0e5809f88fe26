use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub coordinator: CoordinatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub requests: usize,
    pub window_secs: u64,
}

/// Connection settings for the storage coordinator's admin API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoordinatorConfig {
    pub admin_endpoint: String,
    pub admin_token: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub web_endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .unwrap_or_else(|_| "3909".to_string())
                    .parse()?,
            },
            data: DataConfig {
                dir: PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string())),
            },
            session: SessionConfig {
                cookie_name: env::var("SESSION_COOKIE")
                    .unwrap_or_else(|_| "ironconsole_session".to_string()),
                ttl_hours: env::var("SESSION_TTL_HOURS")
                    .unwrap_or_else(|_| "24".to_string())
                    .parse()?,
            },
            rate_limit: RateLimitConfig {
                requests: env::var("RATE_LIMIT_REQUESTS")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()?,
                window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()?,
            },
            coordinator: CoordinatorConfig {
                admin_endpoint: env::var("API_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:3903".to_string()),
                admin_token: env::var("API_ADMIN_KEY").unwrap_or_default(),
                s3_endpoint: env::var("S3_ENDPOINT_URL")
                    .unwrap_or_else(|_| "http://localhost:3900".to_string()),
                s3_region: env::var("S3_REGION").unwrap_or_else(|_| "garage".to_string()),
                web_endpoint: env::var("WEB_ENDPOINT").unwrap_or_default(),
            },
        })
    }
}
