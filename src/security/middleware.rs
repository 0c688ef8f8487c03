//! Cross-origin isolation header injection.
//!
//! [`HeaderInjectionMiddleware`] stamps its [`HeaderSet`] onto the response
//! and hands the exchange to the rest of the pipeline, unchanged otherwise.
//! It never looks at the request: method, path, `Origin` and body are all
//! irrelevant to what it writes.
//!
//! # Placement
//!
//! The host must register this stage before anything that finalizes the
//! response or short-circuits the chain (preflight responders included).
//! Running it after a commit surfaces
//! [`HeaderWriteRejected`](crate::security::HeaderWriteRejected) to the host.
//!
//! ```rust
//! use axum::body::Body;
//! use axum::http::{Request, StatusCode};
//! use isolation_headers::security::{Exchange, HeaderInjectionMiddleware, HeaderWriteRejected};
//!
//! let middleware = HeaderInjectionMiddleware::default();
//! let mut exchange = Exchange::new(Request::get("/health").body(Body::empty()).unwrap());
//!
//! middleware
//!     .handle(&mut exchange, |ex: &mut Exchange| -> Result<(), HeaderWriteRejected> {
//!         ex.respond(StatusCode::OK, Body::from("ok"))
//!     })
//!     .unwrap();
//!
//! let response = exchange.into_response();
//! assert_eq!(response.headers()["access-control-allow-origin"], "http://localhost:5173");
//! ```

use crate::security::exchange::{Continuation, Exchange};
use crate::security::headers::HeaderSet;
use crate::security::layer::HeaderInjectionLayer;

/// Writes a fixed [`HeaderSet`] on every exchange, then delegates.
///
/// Stateless apart from the immutable header table; one value can serve any
/// number of concurrent exchanges.
#[derive(Debug, Clone, Default)]
pub struct HeaderInjectionMiddleware {
    headers: HeaderSet,
}

impl HeaderInjectionMiddleware {
    pub fn new(headers: HeaderSet) -> Self {
        Self { headers }
    }

    pub fn headers(&self) -> &HeaderSet {
        &self.headers
    }

    /// Write the header set (replacing existing values), then run `next`
    /// exactly once and return its result as is.
    ///
    /// If the response is already committed nothing is written, `next` is not
    /// run, and the rejection is converted into `next`'s error type.
    pub fn handle<B, C>(&self, exchange: &mut Exchange<B>, next: C) -> Result<C::Output, C::Error>
    where
        C: Continuation<B>,
    {
        self.headers.write_to(exchange)?;
        next.proceed(exchange)
    }

    /// The same header set as a tower layer for async hosts.
    pub fn layer(&self) -> HeaderInjectionLayer {
        HeaderInjectionLayer::new(self.headers.clone())
    }
}
