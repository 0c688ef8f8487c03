//! Security response headers.
//!
//! # Data Flow
//! ```text
//! IsolationConfig
//!     → headers.rs (HeaderSet, built once at startup)
//!     → middleware.rs (synchronous stage over an Exchange)
//!     → layer.rs (the same stage as a tower Layer for axum)
//! ```
//!
//! # Design Decisions
//! - One immutable header table shared by every request
//! - Replace, never append: each header name appears once on the wire
//! - The request is never inspected

pub mod exchange;
pub mod headers;
pub mod layer;
pub mod middleware;

pub use exchange::{Continuation, Exchange, HeaderWriteRejected};
pub use headers::HeaderSet;
pub use layer::{HeaderInjection, HeaderInjectionLayer};
pub use middleware::HeaderInjectionMiddleware;
