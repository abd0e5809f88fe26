//! Request logging.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;

pub async fn log_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
