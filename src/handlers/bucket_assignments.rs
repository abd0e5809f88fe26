//! Bucket-to-user/tenant assignment endpoints.
//!
//! The coordinator does not store assignments, so these validate their
//! inputs against the record store and acknowledge; enforcement happens
//! nowhere yet.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::{Permission, UserResponse};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct AssignBucketRequest {
    #[serde(default)]
    pub assigned_user_id: Option<String>,
    #[serde(default)]
    pub assigned_tenant_id: Option<String>,
}

/// GET /buckets/{bucketId}/assignment
pub async fn get_assignment(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadBuckets)?;

    let bucket = state.coordinator.get_bucket(&bucket_id).await?;

    let assigned_user = match &bucket.assigned_user_id {
        Some(id) => state.db.get_user(id).ok(),
        None => None,
    };
    let assigned_tenant = match &bucket.assigned_tenant_id {
        Some(id) => state.db.get_tenant(id).ok(),
        None => None,
    };

    Ok(success(json!({
        "bucket_id": bucket.id,
        "bucket_name": bucket.display_name(),
        "assigned_user_id": bucket.assigned_user_id,
        "assigned_tenant_id": bucket.assigned_tenant_id,
        "assigned_user": assigned_user.as_ref().map(UserResponse::from),
        "assigned_tenant": assigned_tenant,
    })))
}

/// PUT /buckets/{bucketId}/assignment
pub async fn assign(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
    Json(req): Json<AssignBucketRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteBuckets)?;

    if req.assigned_user_id.is_some() && req.assigned_tenant_id.is_some() {
        return Err(Error::BadRequest(
            "cannot assign bucket to both user and tenant".to_string(),
        ));
    }

    if let Some(user_id) = &req.assigned_user_id {
        state.db.get_user(user_id)?;
    }
    if let Some(tenant_id) = &req.assigned_tenant_id {
        state.db.get_tenant(tenant_id)?;
    }

    Ok(success(json!({
        "message": "Bucket assignment updated successfully",
        "bucket_id": bucket_id,
        "assigned_user_id": req.assigned_user_id,
        "assigned_tenant_id": req.assigned_tenant_id,
    })))
}

/// DELETE /buckets/{bucketId}/assignment
pub async fn unassign(
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteBuckets)?;

    Ok(success(json!({
        "message": "Bucket assignment removed successfully",
        "bucket_id": bucket_id,
    })))
}

/// GET /users/{userId}/buckets
pub async fn list_user_buckets(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadBuckets)?;

    let assigned = state.db.get_user(&user_id)?;

    Ok(success(json!({
        "user_id": user_id,
        "username": assigned.username,
        "buckets": [],
    })))
}

/// GET /tenants/{tenantId}/buckets
pub async fn list_tenant_buckets(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadBuckets)?;

    let tenant = state.db.get_tenant(&tenant_id)?;

    Ok(success(json!({
        "tenant_id": tenant_id,
        "tenant_name": tenant.name,
        "buckets": [],
    })))
}
