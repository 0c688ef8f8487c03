//! Configuration validation.
//!
//! Serde handles syntax; this module checks meaning. Validation is a pure
//! function over [`ServerConfig`] and reports every problem it finds, not
//! just the first.

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue, Method};
use thiserror::Error;
use url::Url;

use crate::config::schema::{IsolationConfig, ServerConfig};

/// Accepted `Cross-Origin-Opener-Policy` tokens.
const OPENER_POLICIES: &[&str] = &[
    "same-origin",
    "same-origin-allow-popups",
    "noopener-allow-popups",
    "unsafe-none",
];

/// Accepted `Cross-Origin-Embedder-Policy` tokens.
const EMBEDDER_POLICIES: &[&str] = &["require-corp", "credentialless", "unsafe-none"];

const LOG_FORMATS: &[&str] = &["pretty", "json"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// `*` together with credentials is rejected by browsers.
    #[error("allow_origin \"*\" cannot be combined with allow_credentials = true")]
    WildcardWithCredentials,

    #[error("allow_origin {0:?} is not a bare origin (scheme://host[:port])")]
    InvalidOrigin(String),

    #[error("unknown Cross-Origin-Opener-Policy {0:?}")]
    UnknownOpenerPolicy(String),

    #[error("unknown Cross-Origin-Embedder-Policy {0:?}")]
    UnknownEmbedderPolicy(String),

    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("allow_methods must not be empty")]
    NoMethods,

    #[error("invalid header name {0:?}")]
    InvalidHeaderName(String),

    /// The joined value contains bytes not allowed in a header value.
    #[error("invalid value for {header}: {value:?}")]
    InvalidHeaderValue { header: &'static str, value: String },

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("static_prefix {0:?} must start with '/' and not be the root")]
    InvalidStaticPrefix(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("unknown log format {0:?} (expected \"pretty\" or \"json\")")]
    UnknownLogFormat(String),
}

/// Validate the whole configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_isolation(&config.isolation);

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    // axum refuses to nest a service at the root.
    let prefix = &config.http.static_prefix;
    let mountable = prefix.starts_with('/') && !prefix.trim_end_matches('/').is_empty();
    if config.http.static_dir.is_some() && !mountable {
        errors.push(ValidationError::InvalidStaticPrefix(prefix.clone()));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if !LOG_FORMATS.contains(&config.observability.log_format.as_str()) {
        errors.push(ValidationError::UnknownLogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate only the header values.
pub fn validate_isolation(isolation: &IsolationConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if !OPENER_POLICIES.contains(&isolation.opener_policy.as_str()) {
        errors.push(ValidationError::UnknownOpenerPolicy(
            isolation.opener_policy.clone(),
        ));
    }

    if !EMBEDDER_POLICIES.contains(&isolation.embedder_policy.as_str()) {
        errors.push(ValidationError::UnknownEmbedderPolicy(
            isolation.embedder_policy.clone(),
        ));
    }

    if isolation.allow_origin == "*" {
        if isolation.allow_credentials {
            errors.push(ValidationError::WildcardWithCredentials);
        }
    } else if !is_bare_origin(&isolation.allow_origin) {
        errors.push(ValidationError::InvalidOrigin(isolation.allow_origin.clone()));
    }

    if isolation.allow_methods.is_empty() {
        errors.push(ValidationError::NoMethods);
    }
    for method in &isolation.allow_methods {
        if method.parse::<Method>().is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    for name in &isolation.allow_headers {
        if HeaderName::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName(name.clone()));
        }
    }

    errors
}

/// Check a joined header value before it reaches a `HeaderMap`.
pub(crate) fn checked_value(
    header: &'static str,
    value: &str,
) -> Result<HeaderValue, ValidationError> {
    HeaderValue::from_str(value).map_err(|_| ValidationError::InvalidHeaderValue {
        header,
        value: value.to_string(),
    })
}

/// An origin serializes as `scheme://host[:port]` with nothing after it.
fn is_bare_origin(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => {
            let origin = url.origin();
            origin.is_tuple() && origin.ascii_serialization() == candidate
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn test_wildcard_with_credentials_rejected() {
        let mut config = ServerConfig::default();
        config.isolation.allow_origin = "*".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::WildcardWithCredentials]);
    }

    #[test]
    fn test_wildcard_without_credentials_allowed() {
        let mut config = ServerConfig::default();
        config.isolation.allow_origin = "*".into();
        config.isolation.allow_credentials = false;

        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_origin_must_be_bare() {
        for origin in [
            "http://localhost:5173/",
            "http://localhost:5173/app",
            "localhost:5173",
            "",
            "HTTP://LOCALHOST:5173",
        ] {
            let mut isolation = IsolationConfig::default();
            isolation.allow_origin = origin.into();
            assert_eq!(
                validate_isolation(&isolation),
                vec![ValidationError::InvalidOrigin(origin.into())],
                "origin {origin:?} should be rejected"
            );
        }

        let mut isolation = IsolationConfig::default();
        isolation.allow_origin = "https://app.example.com".into();
        assert!(validate_isolation(&isolation).is_empty());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ServerConfig::default();
        config.isolation.opener_policy = "same-site".into();
        config.isolation.embedder_policy = "require".into();
        config.isolation.allow_methods = vec!["GET".into(), "BAD METHOD".into()];
        config.isolation.allow_headers = vec!["Content Type".into()];
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.observability.log_format = "xml".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 7);
        assert!(errors.contains(&ValidationError::UnknownOpenerPolicy("same-site".into())));
        assert!(errors.contains(&ValidationError::InvalidMethod("BAD METHOD".into())));
        assert!(errors.contains(&ValidationError::InvalidHeaderName("Content Type".into())));
        assert!(errors.contains(&ValidationError::ZeroTimeout));
    }

    #[test]
    fn test_static_prefix_checked_only_when_serving() {
        let mut config = ServerConfig::default();
        config.http.static_prefix = "/".into();
        assert!(validate_config(&config).is_ok());

        config.http.static_dir = Some("artifacts".into());
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::InvalidStaticPrefix("/".into())]
        );

        config.http.static_prefix = "/artifacts".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_methods_rejected() {
        let mut isolation = IsolationConfig::default();
        isolation.allow_methods.clear();
        assert_eq!(validate_isolation(&isolation), vec![ValidationError::NoMethods]);
    }
}
