pub mod auth;
pub mod bucket_assignments;
pub mod object_locking;
pub mod proxy;
pub mod s3_config;
pub mod s3_permissions;
pub mod tenants;
pub mod users;

use axum::Json;
use serde::Serialize;
use serde_json::json;

/// Standard success envelope shared by every endpoint.
pub fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": data,
    }))
}
