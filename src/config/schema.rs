//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files, and
//! every section falls back to defaults so an empty file is a valid config.

use serde::{Deserialize, Serialize};

/// Root configuration for the isolation header server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Cross-origin isolation and CORS header values.
    pub isolation: IsolationConfig,

    /// Host pipeline settings (preflight handling, static files).
    pub http: HttpConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Values stamped onto every response.
///
/// The defaults describe a development front end served from
/// `http://localhost:5173` that needs `SharedArrayBuffer`, so COOP/COEP are
/// set alongside a credentialed single-origin CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct IsolationConfig {
    /// `Cross-Origin-Opener-Policy` value.
    pub opener_policy: String,

    /// `Cross-Origin-Embedder-Policy` value.
    pub embedder_policy: String,

    /// The single trusted origin for `Access-Control-Allow-Origin`.
    pub allow_origin: String,

    /// Methods listed in `Access-Control-Allow-Methods`.
    pub allow_methods: Vec<String>,

    /// Request headers listed in `Access-Control-Allow-Headers`.
    pub allow_headers: Vec<String>,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            opener_policy: "same-origin".to_string(),
            embedder_policy: "require-corp".to_string(),
            allow_origin: "http://localhost:5173".to_string(),
            allow_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            allow_credentials: true,
        }
    }
}

/// Host pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Answer `OPTIONS` requests with `204 No Content` before routing.
    pub handle_preflight: bool,

    /// Directory served as static files. Disabled when unset.
    pub static_dir: Option<String>,

    /// URL prefix the static directory is mounted under.
    pub static_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            handle_preflight: true,
            static_dir: None,
            static_prefix: "/artifacts".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}
