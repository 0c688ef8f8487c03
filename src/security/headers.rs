//! The fixed set of isolation and CORS response headers.
//!
//! # Responsibilities
//! - Hold the header table stamped onto every response
//! - Build it from [`IsolationConfig`], refusing combinations browsers reject
//! - Write it with replace semantics so each name appears exactly once
//!
//! # Design Decisions
//! - Built once at startup, never mutated, shared via `Arc`
//! - No branching on the request: the same table is written every time
//! - `*` with credentials cannot be represented

use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};

use crate::config::validation::{checked_value, ValidationError};
use crate::config::IsolationConfig;
use crate::security::exchange::{Exchange, HeaderWriteRejected};

/// `Cross-Origin-Opener-Policy`.
pub static CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");

/// `Cross-Origin-Embedder-Policy`.
pub static CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

static ISOLATION_DEFAULTS: [(HeaderName, HeaderValue); 6] = [
    (
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    ),
    (
        HeaderName::from_static("cross-origin-embedder-policy"),
        HeaderValue::from_static("require-corp"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("http://localhost:5173"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET,POST,OPTIONS"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type,Authorization"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    ),
];

/// An immutable, ordered table of response headers.
///
/// Cloning is one atomic increment; every clone shares the same table.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSet {
    entries: Arc<[(HeaderName, HeaderValue)]>,
}

impl HeaderSet {
    /// The six compiled-in isolation and CORS headers.
    pub fn isolation_defaults() -> Self {
        Self {
            entries: ISOLATION_DEFAULTS.iter().cloned().collect(),
        }
    }

    /// Write every entry into `headers`, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in self.entries.iter() {
            headers.insert(name.clone(), value.clone());
        }
    }

    /// Write every entry onto the exchange's response.
    ///
    /// Nothing is written if the response is already committed.
    pub fn write_to<B>(&self, exchange: &mut Exchange<B>) -> Result<(), HeaderWriteRejected> {
        if exchange.is_committed() {
            return Err(HeaderWriteRejected::committed());
        }
        for (name, value) in self.entries.iter() {
            exchange.set_header(name.clone(), value.clone())?;
        }
        Ok(())
    }

    pub fn get(&self, name: &HeaderName) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for HeaderSet {
    fn default() -> Self {
        Self::isolation_defaults()
    }
}

impl TryFrom<&IsolationConfig> for HeaderSet {
    type Error = ValidationError;

    fn try_from(config: &IsolationConfig) -> Result<Self, Self::Error> {
        if config.allow_origin == "*" && config.allow_credentials {
            return Err(ValidationError::WildcardWithCredentials);
        }

        let mut entries = vec![
            (
                CROSS_ORIGIN_OPENER_POLICY.clone(),
                checked_value("Cross-Origin-Opener-Policy", &config.opener_policy)?,
            ),
            (
                CROSS_ORIGIN_EMBEDDER_POLICY.clone(),
                checked_value("Cross-Origin-Embedder-Policy", &config.embedder_policy)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                checked_value("Access-Control-Allow-Origin", &config.allow_origin)?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_METHODS,
                checked_value(
                    "Access-Control-Allow-Methods",
                    &config.allow_methods.join(","),
                )?,
            ),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                checked_value(
                    "Access-Control-Allow-Headers",
                    &config.allow_headers.join(","),
                )?,
            ),
        ];

        // "true" is the only value the header may carry; absence means no.
        if config.allow_credentials {
            entries.push((
                header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
                HeaderValue::from_static("true"),
            ));
        }

        Ok(Self {
            entries: entries.into(),
        })
    }
}

/// Renders the set as `Name: value` lines in wire order.
impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.entries.iter() {
            let value = String::from_utf8_lossy(value.as_bytes());
            writeln!(f, "{}: {}", canonical_name(name), value)?;
        }
        Ok(())
    }
}

/// `access-control-allow-origin` → `Access-Control-Allow-Origin`.
fn canonical_name(name: &HeaderName) -> String {
    name.as_str()
        .split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
