//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap application routes with the standard middleware stack
//! - Wire up tracing, request IDs, compression, body limits
//! - Truncate keep-alive connections while draining
//! - Serve an error page for unmatched routes

use std::time::Duration;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use tower_http::{
    compression::CompressionLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::http::middleware::{truncate_keep_alive, MakeRequestUuid};
use crate::lifecycle::DrainFlag;

/// HTTP server: application routes plus the standard middleware stack.
///
/// Owns nothing about the listener; binding and lifecycle belong to the
/// [`Coordinator`](crate::lifecycle::Coordinator).
pub struct AppServer {
    router: Router,
}

impl AppServer {
    /// Wrap the given application routes per the configuration.
    pub fn new(config: &ServerConfig, routes: Router, drain: DrainFlag) -> Self {
        // Layers added later run earlier on the request path: the drain check
        // is outermost, mirroring its place at the front of the stack.
        let mut router = routes;
        if config.error_pages {
            router = router.fallback(not_found);
        }
        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));
        let router = if config.compress {
            router.layer(CompressionLayer::new())
        } else {
            router
        };
        let router = router.layer(axum::middleware::from_fn_with_state(
            drain,
            truncate_keep_alive,
        ));

        Self { router }
    }

    /// Consume the server, yielding the composed router for serving.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// JSON error page for unmatched routes.
async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "not found",
            "path": uri.path(),
        })),
    )
}
