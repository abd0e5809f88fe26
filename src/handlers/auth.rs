//! Login, logout and session status.

use crate::error::Result;
use crate::gate::Identity;
use crate::handlers::success;
use crate::models::{AuthStatusResponse, LoginRequest, LoginResponse, UserResponse};
use crate::server::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use tracing::info;

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response> {
    let user = state.db.authenticate_user(&body.username, &body.password)?;
    let session = state.db.create_session(&user.id)?;

    info!("User {} logged in", user.username);

    let mut response = success(LoginResponse {
        user: UserResponse::from(&user),
        token: session.token.clone(),
        expires_at: session.expires_at,
    })
    .into_response();

    response
        .headers_mut()
        .insert(header::SET_COOKIE, state.sessions.set(&session.token));

    Ok(response)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = state.sessions.get(&headers) {
        if let Ok(session) = state.db.get_session_by_token(&token) {
            state.db.delete_session(&session.id)?;
        }
    }

    let mut response = success(json!({ "success": true })).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, state.sessions.clear());

    Ok(response)
}

pub async fn status(Extension(Identity(user)): Extension<Identity>) -> impl IntoResponse {
    success(AuthStatusResponse {
        enabled: true,
        authenticated: true,
        user: Some(UserResponse::from(&user)),
    })
}
