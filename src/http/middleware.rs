//! Request middleware.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4) for tracing
//! - Truncate keep-alive connections once a drain has begun
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The drain check reads the flag before the handler runs, so every request
//!   handled after a drain begins observes it

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::lifecycle::DrainFlag;

/// Request ID maker producing UUID v4 values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Mark the connection for closure after the current response once the
/// server is draining, so no further requests ride the same keep-alive.
pub async fn truncate_keep_alive(
    State(drain): State<DrainFlag>,
    request: Request,
    next: Next,
) -> Response {
    let draining = drain.is_set();
    let mut response = next.run(request).await;
    if draining {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn app(drain: DrainFlag) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                drain,
                truncate_keep_alive,
            ))
    }

    fn request() -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn keep_alive_untouched_while_running() {
        let drain = DrainFlag::new();
        let response = app(drain).oneshot(request()).await.unwrap();

        assert!(response.headers().get(header::CONNECTION).is_none());
    }

    #[tokio::test]
    async fn draining_closes_connection_after_response() {
        let drain = DrainFlag::new();
        let router = app(drain.clone());

        drain.set();
        let response = router.oneshot(request()).await.unwrap();

        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "close"
        );
    }

    #[test]
    fn request_ids_are_unique() {
        let mut maker = MakeRequestUuid;
        let req = axum::http::Request::new(());
        let a = maker.make_request_id(&req).unwrap();
        let b = maker.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
