//! Tenant management.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::{CreateTenantRequest, Permission, UpdateTenantRequest};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;

pub async fn list(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadTenants)?;
    Ok(success(state.db.list_tenants()))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadTenants)?;
    Ok(success(state.db.get_tenant(&id)?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Json(req): Json<CreateTenantRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteTenants)?;

    if req.name.is_empty() {
        return Err(Error::BadRequest("tenant name is required".to_string()));
    }

    Ok(success(state.db.create_tenant(&req)?))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTenantRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteTenants)?;
    Ok(success(state.db.update_tenant(&id, &req)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::DeleteTenants)?;

    state.db.delete_tenant(&id)?;
    Ok(success(json!({ "success": true })))
}

/// Usage summary. Bucket and byte counts come from the coordinator in a
/// later iteration; user membership is served from the local store.
pub async fn stats(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadTenants)?;

    let tenant = state.db.get_tenant(&id)?;
    let user_count = state.db.user_count_for_tenant(&id);

    Ok(success(json!({
        "tenant": tenant,
        "bucket_count": 0,
        "key_count": 0,
        "total_size": 0,
        "user_count": user_count,
    })))
}
