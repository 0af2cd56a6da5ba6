//! # badgetrack HTTP API Module
//!
//! This module implements the JSON API server using axum.
//!
//! ## Endpoints
//!
//! Public:
//! - `GET /health` - Health check
//! - `POST /api/auth/login` - Email and password for a bearer token
//! - `POST /api/auth/register` - Redeem an invitation
//!
//! Session required (`Authorization: Bearer <token>`):
//! - `/api/auth/logout`, `/api/auth/me`
//! - `/api/badges`, `/api/badges/{id}`, `/api/badges/approve`
//! - `/api/categories`, `/api/categories/{id}`
//! - `/api/users`, `/api/users/role`, `/api/users/invite`, `/api/users/bulk-delete`,
//!   `/api/users/me/password`, `/api/users/{id}`, `/api/users/{id}/password`,
//!   `/api/users/{id}/badges`
//! - `/api/submissions`, `/api/submissions/{id}`, `/api/submissions/{id}/visibility`
//!
//! ## Security Configuration
//!
//! See `HttpConfig`: CORS origins, global rate limit, body size limit.

mod auth;
mod error;
mod handlers;
mod middleware;
mod types;

pub use auth::{SessionToken, bearer_token};
pub use error::ApiError;
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::*;

use crate::config::{DEFAULT_BODY_LIMIT_BYTES, DEFAULT_RATE_LIMIT};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use badgetrack_core::{Tracker, TrackerError};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the tracker.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<RwLock<Tracker>>,
}

impl AppState {
    #[must_use]
    pub fn new(tracker: Tracker) -> Self {
        Self {
            tracker: Arc::new(RwLock::new(tracker)),
        }
    }
}

/// Transport-level settings for the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Comma-separated origins, `*` for any, `None` for localhost only.
    pub cors_origins: Option<String>,
    /// Requests per second across all clients. 0 disables limiting.
    pub rate_limit: u32,
    pub body_limit_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_origins: None,
            rate_limit: DEFAULT_RATE_LIMIT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer.
///
/// - `*`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: the comma-separated list of origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure for production!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
/// 5. Session authentication (protected routes only)
pub fn create_router(state: AppState, http: &HttpConfig) -> Router {
    let cors = build_cors_layer(http.cors_origins.as_deref());

    let rate_limiter = if http.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", http.rate_limit);
        Some(create_rate_limiter(http.rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let protected = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout_handler))
        .route("/api/auth/me", get(handlers::auth::me_handler))
        .route(
            "/api/badges",
            get(handlers::badges::list_badges_handler).post(handlers::badges::create_badge_handler),
        )
        .route("/api/badges/approve", post(handlers::badges::approve_handler))
        .route(
            "/api/badges/{id}",
            get(handlers::badges::get_badge_handler)
                .put(handlers::badges::update_badge_handler)
                .delete(handlers::badges::delete_badge_handler),
        )
        .route(
            "/api/categories",
            get(handlers::categories::list_categories_handler)
                .post(handlers::categories::create_category_handler),
        )
        .route(
            "/api/categories/{id}",
            put(handlers::categories::update_category_handler)
                .delete(handlers::categories::delete_category_handler),
        )
        .route("/api/users", get(handlers::users::list_users_handler))
        .route("/api/users/role", put(handlers::users::change_role_handler))
        .route(
            "/api/users/invite",
            get(handlers::users::list_invitations_handler).post(handlers::users::invite_handler),
        )
        .route(
            "/api/users/bulk-delete",
            post(handlers::users::bulk_delete_handler),
        )
        .route(
            "/api/users/me/password",
            put(handlers::users::change_own_password_handler),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user_handler).delete(handlers::users::delete_user_handler),
        )
        .route(
            "/api/users/{id}/password",
            put(handlers::users::reset_password_handler),
        )
        .route(
            "/api/users/{id}/badges",
            get(handlers::users::profile_badges_handler),
        )
        .route(
            "/api/submissions",
            get(handlers::submissions::list_submissions_handler)
                .post(handlers::submissions::create_submission_handler),
        )
        .route(
            "/api/submissions/{id}",
            get(handlers::submissions::get_submission_handler)
                .put(handlers::submissions::review_submission_handler),
        )
        .route(
            "/api/submissions/{id}/visibility",
            put(handlers::submissions::visibility_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::session_auth_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/auth/login", post(handlers::auth::login_handler))
        .route("/api/auth/register", post(handlers::auth::register_handler))
        .merge(protected);

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(http.body_limit_bytes)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and run until Ctrl-C.
pub async fn run_server(
    addr: &str,
    tracker: Tracker,
    http: &HttpConfig,
) -> Result<(), TrackerError> {
    let state = AppState::new(tracker);
    let router = create_router(state, http);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| TrackerError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("badgetrack HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| TrackerError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
