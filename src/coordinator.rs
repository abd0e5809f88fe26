//! HTTP client for the storage coordinator's admin API.
//!
//! The console never talks to the object store directly; bucket and key
//! metadata all come from the coordinator, authenticated with a bearer
//! token. Settings live behind a lock so the S3-config endpoints can
//! update them at runtime without a restart.

use crate::config::CoordinatorConfig;
use crate::error::{Error, Result};
use crate::models::Bucket;
use bytes::Bytes;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub admin_endpoint: String,
    pub admin_token: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub web_endpoint: String,
}

impl From<&CoordinatorConfig> for CoordinatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            admin_endpoint: config.admin_endpoint.clone(),
            admin_token: config.admin_token.clone(),
            s3_endpoint: config.s3_endpoint.clone(),
            s3_region: config.s3_region.clone(),
            web_endpoint: config.web_endpoint.clone(),
        }
    }
}

pub struct Coordinator {
    client: reqwest::Client,
    settings: RwLock<CoordinatorSettings>,
}

impl Coordinator {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings: RwLock::new(CoordinatorSettings::from(config)),
        }
    }

    pub fn settings(&self) -> CoordinatorSettings {
        self.settings.read().unwrap().clone()
    }

    pub fn update_settings(&self, update: impl FnOnce(&mut CoordinatorSettings)) {
        let mut settings = self.settings.write().unwrap();
        update(&mut settings);
    }

    /// GET `path` on the admin API, returning the raw body. Non-success
    /// statuses are surfaced as coordinator errors.
    pub async fn fetch(&self, path: &str) -> Result<Bytes> {
        let (url, token) = self.request_parts(path);
        debug!("Coordinator GET {}", url);

        let response = self.client.get(&url).bearer_auth(&token).send().await?;
        Self::check_status(path, response).await
    }

    /// POST a JSON body to `path` on the admin API.
    pub async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<Bytes> {
        let (url, token) = self.request_parts(path);
        debug!("Coordinator POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await?;
        Self::check_status(path, response).await
    }

    /// Forward an arbitrary request, for the reverse proxy. Returns the
    /// upstream status, content type and body untouched.
    pub async fn forward(
        &self,
        method: &str,
        path_and_query: &str,
        body: Bytes,
    ) -> Result<(u16, Option<String>, Bytes)> {
        let (url, token) = self.request_parts(path_and_query);
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| Error::BadRequest("invalid method".to_string()))?;

        debug!("Proxying {} {}", method, url);

        let response = self
            .client
            .request(method, &url)
            .bearer_auth(&token)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.bytes().await?;

        Ok((status, content_type, body))
    }

    pub async fn get_bucket(&self, id: &str) -> Result<Bucket> {
        let body = self.fetch(&format!("/v2/GetBucketInfo?id={}", id)).await?;
        let bucket = serde_json::from_slice(&body)?;
        Ok(bucket)
    }

    fn request_parts(&self, path: &str) -> (String, String) {
        let settings = self.settings.read().unwrap();
        let base = settings.admin_endpoint.trim_end_matches('/');
        (format!("{}{}", base, path), settings.admin_token.clone())
    }

    async fn check_status(path: &str, response: reqwest::Response) -> Result<Bytes> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Coordinator(format!(
                "{} returned {}: {}",
                path, status, body
            )));
        }
        Ok(response.bytes().await?)
    }
}
