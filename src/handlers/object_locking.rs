//! Object-lock management endpoints.
//!
//! These run behind the fine-grained authorization path: each operation
//! maps to an S3 action that must be authorized by a policy on one of the
//! bucket's access keys (admins bypass the policy check for write-class
//! actions only). The coordinator does not enforce object locking yet, so
//! the write operations validate and acknowledge without a real apply.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::{ObjectLegalHold, ObjectLockConfiguration, ObjectRetention};
use crate::policy::S3Action;
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct PutLockConfigurationRequest {
    pub object_lock_configuration: Option<ObjectLockConfiguration>,
}

#[derive(Debug, Deserialize)]
pub struct PutRetentionRequest {
    pub retention: Option<ObjectRetention>,
}

#[derive(Debug, Deserialize)]
pub struct PutLegalHoldRequest {
    pub legal_hold: Option<ObjectLegalHold>,
}

#[derive(Debug, Deserialize)]
pub struct ListObjectsQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub delimiter: Option<String>,
}

/// GET /buckets/{bucketId}/object-lock
pub async fn get_lock_configuration(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(
        &user,
        &bucket.keys,
        S3Action::GET_BUCKET_OBJECT_LOCK_CONFIGURATION,
        &bucket_id,
    )?;

    let enabled = bucket
        .object_lock_configuration
        .as_ref()
        .map(|config| config.object_lock_enabled)
        .unwrap_or(false);

    Ok(success(json!({
        "bucket_id": bucket_id,
        "object_lock_configuration": bucket.object_lock_configuration,
        "object_lock_enabled": enabled,
    })))
}

/// PUT /buckets/{bucketId}/object-lock
pub async fn put_lock_configuration(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
    Json(req): Json<PutLockConfigurationRequest>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(
        &user,
        &bucket.keys,
        S3Action::PUT_BUCKET_OBJECT_LOCK_CONFIGURATION,
        &bucket_id,
    )?;

    let config = req.object_lock_configuration.ok_or_else(|| {
        Error::BadRequest("object_lock_configuration is required".to_string())
    })?;

    if let Some(retention) = config.rule.as_ref().and_then(|rule| rule.default_retention.as_ref()) {
        if retention.days.is_none() && retention.years.is_none() {
            return Err(Error::BadRequest(
                "either days or years must be specified for default retention".to_string(),
            ));
        }
        if retention.days.is_some() && retention.years.is_some() {
            return Err(Error::BadRequest(
                "cannot specify both days and years for default retention".to_string(),
            ));
        }
    }

    // The coordinator has no object-lock API yet; acknowledge the
    // validated configuration.
    Ok(success(json!({
        "message": "Object lock configuration updated successfully",
        "bucket_id": bucket_id,
        "object_lock_enabled": config.object_lock_enabled,
        "default_retention_enabled": config.rule.is_some(),
    })))
}

/// GET /buckets/{bucketId}/objects/{objectKey}/retention
pub async fn get_retention(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, object_key)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(&user, &bucket.keys, S3Action::GET_OBJECT_RETENTION, &bucket_id)?;

    Ok(success(json!({
        "bucket_id": bucket_id,
        "object_key": object_key,
        "retention": serde_json::Value::Null,
    })))
}

/// PUT /buckets/{bucketId}/objects/{objectKey}/retention
pub async fn put_retention(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, object_key)): Path<(String, String)>,
    Json(req): Json<PutRetentionRequest>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(&user, &bucket.keys, S3Action::PUT_OBJECT_RETENTION, &bucket_id)?;

    let retention = req
        .retention
        .ok_or_else(|| Error::BadRequest("retention is required".to_string()))?;

    if retention.retain_until_date <= Utc::now() {
        return Err(Error::BadRequest(
            "retention date must be in the future".to_string(),
        ));
    }

    Ok(success(json!({
        "message": "Object retention updated successfully",
        "bucket_id": bucket_id,
        "object_key": object_key,
        "retention_mode": retention.mode,
        "retain_until_date": retention.retain_until_date,
    })))
}

/// GET /buckets/{bucketId}/objects/{objectKey}/legal-hold
pub async fn get_legal_hold(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, object_key)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(&user, &bucket.keys, S3Action::GET_OBJECT_LEGAL_HOLD, &bucket_id)?;

    Ok(success(json!({
        "bucket_id": bucket_id,
        "object_key": object_key,
        "legal_hold": { "status": "OFF" },
    })))
}

/// PUT /buckets/{bucketId}/objects/{objectKey}/legal-hold
pub async fn put_legal_hold(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, object_key)): Path<(String, String)>,
    Json(req): Json<PutLegalHoldRequest>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(&user, &bucket.keys, S3Action::PUT_OBJECT_LEGAL_HOLD, &bucket_id)?;

    let legal_hold = req
        .legal_hold
        .ok_or_else(|| Error::BadRequest("legal_hold is required".to_string()))?;

    Ok(success(json!({
        "message": "Object legal hold updated successfully",
        "bucket_id": bucket_id,
        "object_key": object_key,
        "legal_hold_status": legal_hold.status,
    })))
}

/// GET /buckets/{bucketId}/objects — listing with lock information.
pub async fn list_objects(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(bucket_id): Path<String>,
    Query(query): Query<ListObjectsQuery>,
) -> Result<impl IntoResponse> {
    let bucket = state.coordinator.get_bucket(&bucket_id).await?;
    gate::require_s3_action(&user, &bucket.keys, S3Action::LIST_BUCKET, &bucket_id)?;

    // Per-object lock metadata is not exposed by the coordinator yet;
    // report the bucket totals with an empty object list.
    Ok(success(json!({
        "bucket_id": bucket_id,
        "prefix": query.prefix.unwrap_or_default(),
        "delimiter": query.delimiter.unwrap_or_default(),
        "objects": [],
        "object_count": bucket.objects,
        "total_bytes": bucket.bytes,
        "common_prefixes": [],
        "is_truncated": false,
    })))
}
