//! Coordinator connection settings and status.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::Permission;
use crate::server::AppState;
use axum::{extract::State, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateS3ConfigRequest {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub admin_api: Option<String>,
    pub admin_token: Option<String>,
    pub web_endpoint: Option<String>,
}

/// GET /s3/config — the admin token is never echoed back.
pub async fn get_config(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::SystemAdmin)?;

    let settings = state.coordinator.settings();
    Ok(success(json!({
        "region": settings.s3_region,
        "endpoint": settings.s3_endpoint,
        "admin_api": settings.admin_endpoint,
        "web_endpoint": settings.web_endpoint,
    })))
}

/// PUT /s3/config
pub async fn update_config(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Json(req): Json<UpdateS3ConfigRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::SystemAdmin)?;

    state.coordinator.update_settings(|settings| {
        if let Some(region) = req.region {
            settings.s3_region = region;
        }
        if let Some(endpoint) = req.endpoint {
            settings.s3_endpoint = endpoint;
        }
        if let Some(admin_api) = req.admin_api {
            settings.admin_endpoint = admin_api;
        }
        if let Some(admin_token) = req.admin_token {
            settings.admin_token = admin_token;
        }
        if let Some(web_endpoint) = req.web_endpoint {
            settings.web_endpoint = web_endpoint;
        }
    });

    let settings = state.coordinator.settings();
    Ok(success(json!({
        "region": settings.s3_region,
        "endpoint": settings.s3_endpoint,
        "admin_api": settings.admin_endpoint,
        "web_endpoint": settings.web_endpoint,
    })))
}

/// POST /s3/test — probe the coordinator admin API.
pub async fn test_connection(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::SystemAdmin)?;

    state
        .coordinator
        .fetch("/status")
        .await
        .map_err(|e| Error::Unavailable(e.to_string()))?;

    Ok(success(json!({
        "status": "connected",
        "message": "Connection to coordinator API successful",
    })))
}

/// GET /s3/status — coordinator status plus local store counts.
pub async fn get_status(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadCluster)?;

    let body = state.coordinator.fetch("/status").await?;
    let status: serde_json::Value = serde_json::from_slice(&body)?;

    let (users, tenants, sessions) = state.db.counts();

    Ok(success(json!({
        "coordinator": status,
        "console_version": env!("CARGO_PKG_VERSION"),
        "authentication": true,
        "users_count": users,
        "tenants_count": tenants,
        "sessions_count": sessions,
    })))
}
