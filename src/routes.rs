//! API routing.
//!
//! Everything except login sits behind the session middleware; the rate
//! limiter, security headers and CORS wrap the whole surface. Unmatched
//! authenticated routes fall through to the coordinator proxy.

use crate::handlers::{
    auth, bucket_assignments, object_locking, proxy, s3_config, s3_permissions, tenants, users,
};
use crate::middleware::{auth as session_auth, logging, rate_limit, security};
use crate::server::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/status", get(auth::status))
        // User management
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get_one).put(users::update).delete(users::delete),
        )
        .route("/users/:id/buckets", get(bucket_assignments::list_user_buckets))
        // Tenant management
        .route("/tenants", get(tenants::list).post(tenants::create))
        .route(
            "/tenants/:id",
            get(tenants::get_one)
                .put(tenants::update)
                .delete(tenants::delete),
        )
        .route("/tenants/:id/stats", get(tenants::stats))
        .route(
            "/tenants/:id/buckets",
            get(bucket_assignments::list_tenant_buckets),
        )
        // S3 policies and key permissions
        .route("/s3/policies/presets", get(s3_permissions::presets))
        .route("/s3/policies/validate", post(s3_permissions::validate))
        .route(
            "/buckets/:bucket_id/keys/:access_key_id/permissions",
            get(s3_permissions::get_key_permissions)
                .put(s3_permissions::update_key_permissions),
        )
        // Bucket assignments
        .route(
            "/buckets/:bucket_id/assignment",
            get(bucket_assignments::get_assignment)
                .put(bucket_assignments::assign)
                .delete(bucket_assignments::unassign),
        )
        // Object locking
        .route(
            "/buckets/:bucket_id/object-lock",
            get(object_locking::get_lock_configuration)
                .put(object_locking::put_lock_configuration),
        )
        .route("/buckets/:bucket_id/objects", get(object_locking::list_objects))
        .route(
            "/buckets/:bucket_id/objects/:object_key/retention",
            get(object_locking::get_retention).put(object_locking::put_retention),
        )
        .route(
            "/buckets/:bucket_id/objects/:object_key/legal-hold",
            get(object_locking::get_legal_hold).put(object_locking::put_legal_hold),
        )
        // Coordinator configuration
        .route(
            "/s3/config",
            get(s3_config::get_config).put(s3_config::update_config),
        )
        .route("/s3/test", post(s3_config::test_connection))
        .route("/s3/status", get(s3_config::get_status))
        // Everything else goes to the coordinator
        .fallback(proxy::forward)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_auth::require_session,
        ));

    Router::new()
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .layer(middleware::from_fn(logging::log_requests))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(security::security_headers))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit,
        ))
        .with_state(state)
}
