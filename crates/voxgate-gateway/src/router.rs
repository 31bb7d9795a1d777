use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{health_handler, method_not_allowed, transcribe_handler};
use crate::server::AppState;

/// Slack on top of the payload ceiling for multipart framing overhead. The
/// exact ceiling is enforced by the receiver, which answers 400; this cap
/// only stops a runaway body.
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub(crate) fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let body_limit = usize::try_from(state.limits.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(BODY_LIMIT_SLACK);

    Router::new()
        // OPTIONS is short-circuited by the CORS layer; every other
        // non-POST method lands on the JSON 405 fallback.
        .route(
            "/transcribe",
            post(transcribe_handler).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
