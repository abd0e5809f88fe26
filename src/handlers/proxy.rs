//! Reverse proxy for the rest of the coordinator admin API.
//!
//! Any authenticated route the console does not handle itself is forwarded
//! verbatim, with the coordinator bearer token attached.

use crate::error::{Error, Result};
use crate::server::AppState;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header,
    response::Response,
};

pub async fn forward(State(state): State<AppState>, request: Request) -> Result<Response> {
    let method = request.method().as_str().to_string();
    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let body = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| Error::BadRequest(format!("failed to read request body: {}", e)))?;

    let (status, content_type, body) = state
        .coordinator
        .forward(&method, &path_and_query, body)
        .await?;

    let mut response = Response::builder().status(status);
    if let Some(content_type) = content_type {
        response = response.header(header::CONTENT_TYPE, content_type);
    }

    response
        .body(Body::from(body))
        .map_err(|e| Error::Internal(anyhow::anyhow!("failed to build proxy response: {}", e)))
}
