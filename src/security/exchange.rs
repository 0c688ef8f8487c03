//! One request/response pair in flight, and the continuation that finishes it.
//!
//! A synchronous pipeline stage receives `&mut Exchange` together with a
//! [`Continuation`] standing for "the rest of the pipeline". The exchange is
//! owned by the host for the whole call; stages only borrow it.
//!
//! Once a stage [`respond`](Exchange::respond)s or [`commit`](Exchange::commit)s,
//! the response head is final and further writes fail with
//! [`HeaderWriteRejected`].

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use thiserror::Error;

/// The response was already committed when a stage tried to change it.
///
/// This is an ordering bug in the surrounding pipeline, not a runtime
/// condition: retrying fails the same way.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("response already committed{}", describe(.header))]
pub struct HeaderWriteRejected {
    /// The header being written, if the rejected write was a header.
    pub header: Option<HeaderName>,
}

impl HeaderWriteRejected {
    pub(crate) fn committed() -> Self {
        Self { header: None }
    }
}

fn describe(header: &Option<HeaderName>) -> String {
    match header {
        Some(name) => format!("; cannot write header `{name}`"),
        None => String::new(),
    }
}

/// A single HTTP request/response exchange.
#[derive(Debug)]
pub struct Exchange<B = Body> {
    request: Request<B>,
    response: Response<B>,
    committed: bool,
}

impl<B: Default> Exchange<B> {
    /// Start an exchange with an empty `200 OK` response.
    pub fn new(request: Request<B>) -> Self {
        Self::with_response(request, Response::new(B::default()))
    }
}

impl<B> Exchange<B> {
    /// Start an exchange from a partially prepared response.
    pub fn with_response(request: Request<B>, response: Response<B>) -> Self {
        Self {
            request,
            response,
            committed: false,
        }
    }

    pub fn request(&self) -> &Request<B> {
        &self.request
    }

    pub fn response(&self) -> &Response<B> {
        &self.response
    }

    pub fn response_headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Set a response header, replacing every existing value of that name.
    pub fn set_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), HeaderWriteRejected> {
        if self.committed {
            return Err(HeaderWriteRejected { header: Some(name) });
        }
        self.response.headers_mut().insert(name, value);
        Ok(())
    }

    /// Add a response header alongside existing values of that name.
    pub fn append_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), HeaderWriteRejected> {
        if self.committed {
            return Err(HeaderWriteRejected { header: Some(name) });
        }
        self.response.headers_mut().append(name, value);
        Ok(())
    }

    /// Write status and body, then commit.
    pub fn respond(&mut self, status: StatusCode, body: B) -> Result<(), HeaderWriteRejected> {
        if self.committed {
            return Err(HeaderWriteRejected::committed());
        }
        *self.response.status_mut() = status;
        *self.response.body_mut() = body;
        self.committed = true;
        Ok(())
    }

    /// Mark the response head as sent. Idempotent.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn into_response(self) -> Response<B> {
        self.response
    }
}

/// The remainder of a pipeline, invoked at most once per exchange.
///
/// Implemented for every `FnOnce(&mut Exchange<B>) -> Result<T, E>` whose
/// error can absorb a [`HeaderWriteRejected`].
pub trait Continuation<B> {
    type Output;
    type Error: From<HeaderWriteRejected>;

    fn proceed(self, exchange: &mut Exchange<B>) -> Result<Self::Output, Self::Error>;
}

impl<B, F, T, E> Continuation<B> for F
where
    F: FnOnce(&mut Exchange<B>) -> Result<T, E>,
    E: From<HeaderWriteRejected>,
{
    type Output = T;
    type Error = E;

    fn proceed(self, exchange: &mut Exchange<B>) -> Result<T, E> {
        self(exchange)
    }
}
