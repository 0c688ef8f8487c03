//! Preflight short-circuit.
//!
//! Answers every `OPTIONS` request with `204 No Content` without reaching
//! the routes. It writes no CORS headers itself: it sits inside the header
//! injection layer, which stamps them on the way out.

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn short_circuit(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answering preflight");
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}
