//! Typed errors for the transform core.
//!
//! Every failure here is a static configuration defect, never a transient
//! condition, so none of them are retried by callers.

use thiserror::Error;

// ── Property-string errors ────────────────────────────────────────────────────

/// Errors raised while parsing a `key=value,key=value` property string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyParseError {
    #[error("property '{segment}' is missing a '=' separator")]
    MissingSeparator { segment: String },

    #[error("property '{segment}' has an empty key")]
    EmptyKey { segment: String },

    #[error("quoted value for '{key}' is never closed")]
    UnterminatedQuote { key: String },
}

// ── Build errors ──────────────────────────────────────────────────────────────

/// Errors raised while building a [`LaunchRequest`](crate::LaunchRequest).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("no launch URI configured; set 'uri' before sending messages")]
    MissingUri,

    #[error("malformed {field}: {source}")]
    MalformedPropertyString {
        field: &'static str,
        #[source]
        source: PropertyParseError,
    },
}

impl BuildError {
    /// Short machine-readable code, used in error-channel headers and JSON
    /// error output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingUri => "missing_uri",
            Self::MalformedPropertyString { .. } => "malformed_property_string",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_property_display_names_field_and_segment() {
        let err = BuildError::MalformedPropertyString {
            field: "deploymentProperties",
            source: PropertyParseError::MissingSeparator {
                segment: "oops".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("deploymentProperties"), "{msg}");
        assert!(msg.contains("oops"), "{msg}");
    }

    #[test]
    fn codes_are_distinct() {
        let malformed = BuildError::MalformedPropertyString {
            field: "environmentProperties",
            source: PropertyParseError::EmptyKey {
                segment: "=x".to_string(),
            },
        };
        assert_eq!(BuildError::MissingUri.code(), "missing_uri");
        assert_eq!(malformed.code(), "malformed_property_string");
    }
}
