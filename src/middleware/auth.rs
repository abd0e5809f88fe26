//! Session authentication middleware.
//!
//! Resolves the caller's identity from the session cookie before any
//! handler runs. Sessions that point at deleted or disabled accounts are
//! invalidated on the spot.

use crate::error::Error;
use crate::gate::Identity;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = state.sessions.get(request.headers()) else {
        debug!("Request without session, returning 401");
        return Error::Unauthorized.into_response();
    };

    let session = match state.db.get_session_by_token(&token) {
        Ok(session) => session,
        Err(_) => {
            debug!("Unknown or expired session token, returning 401");
            return Error::Unauthorized.into_response();
        }
    };

    match state.db.get_user(&session.user_id) {
        Ok(user) if user.enabled => {
            request.extensions_mut().insert(Identity(user));
            next.run(request).await
        }
        _ => {
            // The account behind this session is gone or disabled; the
            // session must not stay usable.
            let _ = state.db.delete_session(&session.id);

            let mut response = Error::Unauthorized.into_response();
            response
                .headers_mut()
                .insert(header::SET_COOKIE, state.sessions.clear());
            response
        }
    }
}
