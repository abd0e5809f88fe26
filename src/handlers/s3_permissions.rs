//! Per-access-key S3 permission management: preset catalog, policy
//! validation, and reading/writing the permissions attached to a key.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::{Permission, Permissions};
use crate::policy::{self, S3Policy};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct UpdateKeyPermissionsRequest {
    /// "preset" or "custom"; ignored in legacy mode.
    #[serde(default)]
    pub policy_type: String,
    #[serde(default)]
    pub policy_name: String,
    #[serde(default)]
    pub policy: Option<S3Policy>,
    #[serde(default)]
    pub legacy_mode: bool,
    #[serde(default)]
    pub legacy: Option<Permissions>,
}

#[derive(Debug, Serialize)]
pub struct KeyPermissionsResponse {
    pub access_key_id: String,
    pub name: String,
    pub legacy_mode: bool,
    pub legacy_permissions: Permissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3_policy: Option<S3Policy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_json: Option<String>,
}

/// GET /s3/policies/presets
pub async fn presets(
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadKeys)?;

    let mut catalog = serde_json::Map::new();
    for (name, preset) in policy::preset_policies() {
        let policy_json = preset.to_json()?;
        catalog.insert(
            name.clone(),
            json!({
                "name": name,
                "description": policy::preset_description(&name),
                "policy": preset,
                "policy_json": policy_json,
            }),
        );
    }

    Ok(success(catalog))
}

/// POST /s3/policies/validate
pub async fn validate(
    Extension(Identity(user)): Extension<Identity>,
    Json(policy): Json<S3Policy>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadKeys)?;

    let errors = policy::validate_policy(&policy);

    let mut response = json!({
        "valid": errors.is_empty(),
        "errors": errors,
    });

    if errors.is_empty() {
        response["message"] = json!("Policy is valid");
        response["legacy_equivalent"] = serde_json::to_value(policy::policy_to_legacy(&policy))?;
    }

    Ok(success(response))
}

/// GET /buckets/{bucketId}/keys/{accessKeyId}/permissions
pub async fn get_key_permissions(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, access_key_id)): Path<(String, String)>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadKeys)?;

    let bucket = state.coordinator.get_bucket(&bucket_id).await?;

    let key = bucket
        .keys
        .iter()
        .find(|key| key.access_key_id == access_key_id)
        .ok_or_else(|| Error::NotFound("key".to_string()))?;

    let policy_json = match &key.s3_policy {
        Some(policy) => Some(policy.to_json()?),
        None => None,
    };

    Ok(success(KeyPermissionsResponse {
        access_key_id: key.access_key_id.clone(),
        name: key.name.clone(),
        legacy_mode: key.s3_policy.is_none(),
        legacy_permissions: key.permissions,
        s3_policy: key.s3_policy.clone(),
        policy_json,
    }))
}

/// PUT /buckets/{bucketId}/keys/{accessKeyId}/permissions
///
/// Accepts a legacy triple, a preset name, or a custom policy. The
/// coordinator only understands the legacy triple, so policies are folded
/// through the bridge before the grant call.
pub async fn update_key_permissions(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path((bucket_id, access_key_id)): Path<(String, String)>,
    Json(req): Json<UpdateKeyPermissionsRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteKeys)?;

    if req.legacy_mode && req.legacy.is_none() {
        return Err(Error::BadRequest(
            "legacy permissions required when legacy_mode is true".to_string(),
        ));
    }

    let mut applied_policy = None;

    let legacy = if req.legacy_mode {
        req.legacy.unwrap_or_default()
    } else {
        let policy = match req.policy_type.as_str() {
            "preset" => {
                if req.policy_name.is_empty() {
                    return Err(Error::BadRequest(
                        "policy_name required for preset policies".to_string(),
                    ));
                }
                policy::preset_policy(&req.policy_name)
                    .ok_or_else(|| Error::NotFound("preset policy".to_string()))?
            }
            "custom" => {
                let policy = req.policy.ok_or_else(|| {
                    Error::BadRequest("policy required for custom policies".to_string())
                })?;
                let errors = policy::validate_policy(&policy);
                if !errors.is_empty() {
                    return Err(Error::Validation(errors));
                }
                policy
            }
            other => {
                return Err(Error::BadRequest(format!(
                    "unknown policy_type: {}",
                    other
                )));
            }
        };

        let legacy = policy::policy_to_legacy(&policy);
        applied_policy = Some(policy);
        legacy
    };

    let grant = json!({
        "permissions": {
            "read": legacy.read,
            "write": legacy.write,
            "owner": legacy.owner,
        },
    });

    state
        .coordinator
        .post_json(
            &format!(
                "/v2/AllowBucketKey?id={}&accessKeyId={}",
                bucket_id, access_key_id
            ),
            &grant,
        )
        .await?;

    info!(
        "Key {} permissions updated on bucket {} by {}",
        access_key_id, bucket_id, user.username
    );

    Ok(success(json!({
        "message": "Key permissions updated successfully",
        "access_key_id": access_key_id,
        "legacy_mode": req.legacy_mode,
        "policy_applied": applied_policy.is_some(),
    })))
}
