//! Observability subsystem.
//!
//! Server lifecycle events are logged with structured fields, and
//! `TraceLayer` opens one span per request. The header injection stage
//! itself stays silent.

pub mod logging;
