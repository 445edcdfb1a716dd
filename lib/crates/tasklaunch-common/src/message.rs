//! Message envelopes exchanged over the input, output and error channels.
//!
//! On the wire an envelope is a JSON object `{"payload": "...", "headers": {...}}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Header names understood by the transform boundary.
pub mod headers {
    /// Content type of the payload.
    pub const CONTENT_TYPE: &str = "contentType";
    /// Display text of the error that rejected a message.
    pub const EXCEPTION_MESSAGE: &str = "x-exception-message";
    /// Machine-readable code of the error that rejected a message.
    pub const EXCEPTION_CODE: &str = "x-exception-code";
    /// Channel the rejected message was consumed from.
    pub const ORIGINAL_CHANNEL: &str = "x-original-channel";
}

/// Content type set on every emitted launch request.
pub const APPLICATION_JSON: &str = "application/json";

pub type Headers = BTreeMap<String, String>;

/// A message consumed from the input channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncomingMessage {
    pub payload: String,
    #[serde(default)]
    pub headers: Headers,
}

impl IncomingMessage {
    /// Message with the given payload and no headers.
    #[must_use]
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            headers: Headers::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Decode a raw channel entry.
    ///
    /// Entries that are not a JSON envelope are taken as a bare payload
    /// with no headers, so producers may push plain strings.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match serde_json::from_str::<Self>(raw) {
            Ok(message) if raw.trim_start().starts_with('{') => message,
            _ => Self::new(raw),
        }
    }

    /// The dead-letter form of this message: original payload and headers
    /// plus the exception and origin headers.
    #[must_use]
    pub fn rejected(&self, error: &BuildError, channel: &str) -> Self {
        self.clone()
            .with_header(headers::EXCEPTION_MESSAGE, error.to_string())
            .with_header(headers::EXCEPTION_CODE, error.code())
            .with_header(headers::ORIGINAL_CHANNEL, channel)
    }

    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// A message ready to be pushed to the output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub payload: String,
    #[serde(default)]
    pub headers: Headers,
}

impl OutgoingMessage {
    /// Content type header, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(headers::CONTENT_TYPE).map(String::as_str)
    }

    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_wire(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn from_wire_accepts_envelope() {
        let msg = IncomingMessage::from_wire(r#"{"payload":"hello","headers":{"id":"42"}}"#);
        assert_eq!(msg.payload, "hello");
        assert_eq!(msg.headers.get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn from_wire_falls_back_to_raw_payload() {
        assert_eq!(IncomingMessage::from_wire("hello world").payload, "hello world");
        assert_eq!(IncomingMessage::from_wire("").payload, "");
        assert_eq!(IncomingMessage::from_wire("\"quoted\"").payload, "\"quoted\"");
        assert_eq!(IncomingMessage::from_wire("{not json").payload, "{not json");
        assert_eq!(IncomingMessage::from_wire(r#"{"x":1}"#).payload, r#"{"x":1}"#);
        assert_eq!(IncomingMessage::from_wire(r#"["a",{}]"#).payload, r#"["a",{}]"#);
    }

    #[test]
    fn from_wire_envelope_without_headers() {
        let msg = IncomingMessage::from_wire(r#"{"payload":""}"#);
        assert_eq!(msg, IncomingMessage::new(""));
    }

    #[test]
    fn rejected_keeps_original_and_adds_headers() {
        let msg = IncomingMessage::new("hello").with_header("id", "7");
        let dead = msg.rejected(&BuildError::MissingUri, "tasklaunch:input");
        assert_eq!(dead.payload, "hello");
        assert_eq!(dead.headers["id"], "7");
        assert_eq!(dead.headers[headers::EXCEPTION_CODE], "missing_uri");
        assert_eq!(dead.headers[headers::ORIGINAL_CHANNEL], "tasklaunch:input");
        assert!(dead.headers[headers::EXCEPTION_MESSAGE].contains("URI"));
    }

    #[test]
    fn outgoing_wire_round_trip() {
        let out = OutgoingMessage {
            payload: "{}".to_string(),
            headers: Headers::from([(
                headers::CONTENT_TYPE.to_string(),
                APPLICATION_JSON.to_string(),
            )]),
        };
        let back = OutgoingMessage::from_wire(&out.to_wire().unwrap()).unwrap();
        assert_eq!(back, out);
        assert_eq!(back.content_type(), Some(APPLICATION_JSON));
    }
}
