//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the isolation header set once from configuration
//! - Create the Axum Router with the built-in routes
//! - Wire up middleware in a fixed, documented order
//! - Bind server to listener and drain on shutdown
//!
//! # Layer order
//! Innermost first; each line wraps everything above it:
//! ```text
//! routes (/health, static dir) + 404 fallback
//!     → TimeoutLayer        (408 when a handler is too slow)
//!     → preflight           (OPTIONS → 204, optional)
//!     → HeaderInjectionLayer
//!     → TraceLayer
//! ```
//! The header layer must stay outside every stage that can produce or
//! short-circuit a response, so preflight replies, timeouts, 404s and 405s
//! all leave with the isolation headers.

use std::time::Duration;

use axum::{http::StatusCode, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validate_config, ConfigError, ServerConfig};
use crate::http::{handlers, preflight};
use crate::security::{HeaderInjectionMiddleware, HeaderSet};

/// HTTP server hosting the header injection middleware.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    middleware: HeaderInjectionMiddleware,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The whole configuration is validated first; nothing is mounted until
    /// it passes.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let headers = HeaderSet::try_from(&config.isolation)
            .map_err(|e| ConfigError::Validation(vec![e]))?;
        let middleware = HeaderInjectionMiddleware::new(headers);
        let router = Self::build_router(Self::routes(&config), &config, &middleware);

        Ok(Self {
            router,
            config,
            middleware,
        })
    }

    /// Built-in routes: health probe and the optional static directory.
    fn routes(config: &ServerConfig) -> Router {
        let mut router = Router::new().route("/health", get(handlers::health));

        if let Some(dir) = &config.http.static_dir {
            router = router.nest_service(&config.http.static_prefix, ServeDir::new(dir));
        }

        router
    }

    /// Wrap `routes` in the fallback and every middleware layer.
    fn build_router(
        routes: Router,
        config: &ServerConfig,
        injection: &HeaderInjectionMiddleware,
    ) -> Router {
        // Layers only wrap what is already registered, fallback included.
        let timeout = Duration::from_secs(config.timeouts.request_secs);
        let mut router = routes
            .fallback(handlers::not_found)
            .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout));

        if config.http.handle_preflight {
            router = router.layer(middleware::from_fn(preflight::short_circuit));
        }

        router
            .layer(injection.layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            allow_origin = %self.config.isolation.allow_origin,
            headers = self.middleware.headers().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The composed router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn middleware(&self) -> &HeaderInjectionMiddleware {
        &self.middleware
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, HeaderMap, Method, Request};

    use crate::config::ValidationError;
    use tower::ServiceExt;

    use super::*;

    fn assert_isolation_headers(headers: &HeaderMap) {
        for (name, value) in HeaderSet::default().iter() {
            let values: Vec<_> = headers.get_all(name).iter().collect();
            assert_eq!(values, vec![value], "header {name}");
        }
    }

    async fn send(router: Router, request: Request<Body>) -> axum::response::Response {
        router.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_carries_headers() {
        let server = HttpServer::new(ServerConfig::default()).unwrap();
        let res = send(
            server.router(),
            Request::get("/health").body(Body::empty()).unwrap(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_isolation_headers(res.headers());
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_preflight_short_circuit_still_gets_headers() {
        let server = HttpServer::new(ServerConfig::default()).unwrap();
        let res = send(
            server.router(),
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/resource")
                .header(header::ORIGIN, "http://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        assert_isolation_headers(res.headers());
        assert_eq!(
            res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed_get_headers() {
        let mut config = ServerConfig::default();
        config.http.handle_preflight = false;
        let server = HttpServer::new(config).unwrap();

        let res = send(
            server.router(),
            Request::get("/missing").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_isolation_headers(res.headers());

        let res = send(
            server.router(),
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_isolation_headers(res.headers());
    }

    #[tokio::test]
    async fn test_static_files_are_isolated() {
        let dir = std::env::temp_dir().join(format!("isolation-headers-static-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("worklet.js"), "registerProcessor('x', class {});").unwrap();

        let mut config = ServerConfig::default();
        config.http.static_dir = Some(dir.to_string_lossy().into_owned());
        let server = HttpServer::new(config).unwrap();

        let res = send(
            server.router(),
            Request::get("/artifacts/worklet.js").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_isolation_headers(res.headers());

        let res = send(
            server.router(),
            Request::get("/artifacts/worklet.js")
                .header(header::RANGE, "bytes=0-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
        assert_isolation_headers(res.headers());
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"register");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_timeout_response_carries_headers() {
        let mut config = ServerConfig::default();
        config.timeouts.request_secs = 1;
        let injection = HeaderInjectionMiddleware::default();

        let routes = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "too late"
            }),
        );
        let router = HttpServer::build_router(routes, &config, &injection);

        let res = send(router, Request::get("/slow").body(Body::empty()).unwrap()).await;

        assert_eq!(res.status(), StatusCode::REQUEST_TIMEOUT);
        assert_isolation_headers(res.headers());
    }

    #[test]
    fn test_root_static_prefix_refused() {
        let mut config = ServerConfig::default();
        config.http.static_dir = Some(std::env::temp_dir().to_string_lossy().into_owned());
        config.http.static_prefix = "/".into();

        match HttpServer::new(config) {
            Err(ConfigError::Validation(errors)) => assert_eq!(
                errors,
                vec![ValidationError::InvalidStaticPrefix("/".into())]
            ),
            Err(other) => panic!("expected validation error, got {other}"),
            Ok(_) => panic!("root static prefix accepted"),
        }
    }

    #[test]
    fn test_wildcard_with_credentials_refused() {
        let mut config = ServerConfig::default();
        config.isolation.allow_origin = "*".into();

        match HttpServer::new(config) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors, vec![ValidationError::WildcardWithCredentials])
            }
            Err(other) => panic!("expected validation error, got {other}"),
            Ok(_) => panic!("wildcard origin with credentials accepted"),
        }
    }
}
