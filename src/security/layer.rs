//! Tower adapter for the header injection middleware.
//!
//! In a tower stack the response only exists once the inner service returns,
//! so the headers are written on the way out. Because [`HeaderMap::insert`]
//! replaces every value of a name, whatever an inner stage set for the same
//! names is overwritten and the client sees exactly one copy of each.
//!
//! [`HeaderMap::insert`]: axum::http::HeaderMap::insert

use std::task::{Context, Poll};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::security::headers::HeaderSet;

/// Applies a [`HeaderSet`] to every response of the wrapped service.
#[derive(Debug, Clone, Default)]
pub struct HeaderInjectionLayer {
    headers: HeaderSet,
}

impl HeaderInjectionLayer {
    pub fn new(headers: HeaderSet) -> Self {
        Self { headers }
    }
}

impl<S> Layer<S> for HeaderInjectionLayer {
    type Service = HeaderInjection<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderInjection {
            inner,
            headers: self.headers.clone(),
        }
    }
}

/// Service produced by [`HeaderInjectionLayer`].
#[derive(Debug, Clone)]
pub struct HeaderInjection<S> {
    inner: S,
    headers: HeaderSet,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for HeaderInjection<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let headers = self.headers.clone();
        let future = self.inner.call(req);

        Box::pin(async move {
            let mut response = future.await?;
            headers.apply(response.headers_mut());
            Ok(response)
        })
    }
}
