//! Operator account management.

use crate::error::{Error, Result};
use crate::gate::{self, Identity};
use crate::handlers::success;
use crate::models::{CreateUserRequest, Permission, UpdateUserRequest, UserResponse};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use tracing::info;

pub async fn list(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadUsers)?;

    let users: Vec<UserResponse> = state.db.list_users().iter().map(UserResponse::from).collect();
    Ok(success(users))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::ReadUsers)?;

    let found = state.db.get_user(&id)?;
    Ok(success(UserResponse::from(&found)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteUsers)?;

    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(Error::BadRequest(
            "username, email and password are required".to_string(),
        ));
    }

    let created = state.db.create_user(&req)?;
    info!("User {} created by {}", created.username, user.username);

    Ok(success(UserResponse::from(&created)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::WriteUsers)?;

    let updated = state.db.update_user(&id, &req)?;
    Ok(success(UserResponse::from(&updated)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(Identity(user)): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    gate::require_permission(&user, Permission::DeleteUsers)?;

    if user.id == id {
        return Err(Error::BadRequest(
            "cannot delete your own account".to_string(),
        ));
    }

    state.db.delete_user(&id)?;
    info!("User {} deleted by {}", id, user.username);

    Ok(success(json!({ "success": true })))
}
