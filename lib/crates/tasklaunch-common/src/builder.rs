//! Builds a [`LaunchRequest`] from static configuration, once per message.

use std::collections::BTreeMap;

use crate::config::{TransformConfig, fields};
use crate::error::BuildError;
use crate::message::{APPLICATION_JSON, IncomingMessage, OutgoingMessage, headers};
use crate::properties::{parse_properties, split_command_line};
use crate::request::{LaunchRequest, generate_application_name};

/// Borrowing builder over a resolved [`TransformConfig`].
///
/// Holds no mutable state, so one builder can serve any number of
/// concurrent messages.
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequestBuilder<'a> {
    config: &'a TransformConfig,
}

impl<'a> LaunchRequestBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a TransformConfig) -> Self {
        Self { config }
    }

    /// Build the launch request for one inbound message.
    ///
    /// The message payload and headers do not influence the result; an
    /// empty payload is ordinary input.
    pub fn build(&self, _message: &IncomingMessage) -> Result<LaunchRequest, BuildError> {
        let config = self.config;

        let uri = match config.uri.as_deref() {
            Some(uri) if !uri.is_empty() => uri.to_string(),
            _ => return Err(BuildError::MissingUri),
        };

        let application_name = match config.application_name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => generate_application_name(),
        };

        let command_line_arguments = config
            .command_line_arguments
            .as_deref()
            .map(split_command_line)
            .unwrap_or_default();

        let deployment_properties = parse_field(
            fields::DEPLOYMENT_PROPERTIES,
            config.deployment_properties.as_deref(),
        )?;

        let mut environment_properties = parse_field(
            fields::ENVIRONMENT_PROPERTIES,
            config.environment_properties.as_deref(),
        )?;
        for (key, value) in config.datasource_overrides() {
            environment_properties.insert(key.to_string(), value.to_string());
        }

        Ok(LaunchRequest {
            uri,
            application_name,
            command_line_arguments,
            environment_properties,
            deployment_properties,
        })
    }

    /// Build the request and wrap it as the outgoing message.
    ///
    /// Inbound headers are carried over; `contentType` is always
    /// `application/json`.
    ///
    /// # Panics
    ///
    /// Only if `serde_json` fails to serialize plain strings and string maps.
    #[allow(clippy::expect_used)]
    pub fn transform(&self, message: &IncomingMessage) -> Result<OutgoingMessage, BuildError> {
        let request = self.build(message)?;
        // Strings, a string list and string-keyed maps: serialization cannot fail.
        let payload =
            serde_json::to_string(&request).expect("LaunchRequest serializes to JSON");

        let mut out_headers = message.headers.clone();
        out_headers.insert(
            headers::CONTENT_TYPE.to_string(),
            APPLICATION_JSON.to_string(),
        );

        Ok(OutgoingMessage {
            payload,
            headers: out_headers,
        })
    }
}

fn parse_field(
    field: &'static str,
    raw: Option<&str>,
) -> Result<BTreeMap<String, String>, BuildError> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };
    parse_properties(raw).map_err(|source| BuildError::MalformedPropertyString { field, source })
}

/// Build a [`LaunchRequest`] for `message` under `config`.
pub fn build_launch_request(
    config: &TransformConfig,
    message: &IncomingMessage,
) -> Result<LaunchRequest, BuildError> {
    LaunchRequestBuilder::new(config).build(message)
}

/// Build and wrap the outgoing message for `message` under `config`.
pub fn transform(
    config: &TransformConfig,
    message: &IncomingMessage,
) -> Result<OutgoingMessage, BuildError> {
    LaunchRequestBuilder::new(config).transform(message)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::config::datasource;
    use crate::error::PropertyParseError;
    use crate::request::GENERATED_NAME_PREFIX;
    use proptest::prelude::*;

    const DEFAULT_URI: &str = "MY_URI";

    fn hello() -> IncomingMessage {
        IncomingMessage::new("hello")
    }

    #[test]
    fn default_config_builds_minimal_request() {
        let cfg = TransformConfig::with_uri(DEFAULT_URI);
        for payload in ["hello", "hello world", "hi!", ""] {
            let req = build_launch_request(&cfg, &IncomingMessage::new(payload)).unwrap();
            assert_eq!(req.uri, DEFAULT_URI);
            assert!(req.application_name.starts_with(GENERATED_NAME_PREFIX));
            assert!(req.command_line_arguments.is_empty());
            assert!(req.environment_properties.is_empty());
            assert!(req.deployment_properties.is_empty());
        }
    }

    #[test]
    fn missing_uri_is_rejected() {
        let err = build_launch_request(&TransformConfig::default(), &hello()).unwrap_err();
        assert_eq!(err, BuildError::MissingUri);
    }

    #[test]
    fn empty_uri_is_rejected() {
        let err = build_launch_request(&TransformConfig::with_uri(""), &hello()).unwrap_err();
        assert_eq!(err, BuildError::MissingUri);
    }

    #[test]
    fn configured_application_name_is_used_verbatim() {
        let cfg = TransformConfig {
            application_name: Some("fooTest".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let first = build_launch_request(&cfg, &hello()).unwrap();
        let second = build_launch_request(&cfg, &hello()).unwrap();
        assert_eq!(first.application_name, "fooTest");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_application_name_is_treated_as_unset() {
        let cfg = TransformConfig {
            application_name: Some(String::new()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let req = build_launch_request(&cfg, &hello()).unwrap();
        assert!(req.application_name.starts_with(GENERATED_NAME_PREFIX));
        assert!(req.application_name.len() > GENERATED_NAME_PREFIX.len());
    }

    #[test]
    fn generated_application_name_differs_between_builds() {
        let cfg = TransformConfig::with_uri(DEFAULT_URI);
        let first = build_launch_request(&cfg, &hello()).unwrap();
        let second = build_launch_request(&cfg, &hello()).unwrap();
        assert_ne!(first.application_name, second.application_name);
        assert_eq!(
            LaunchRequest {
                application_name: String::new(),
                ..first
            },
            LaunchRequest {
                application_name: String::new(),
                ..second
            }
        );
    }

    #[test]
    fn datasource_fields_populate_environment() {
        let cfg = TransformConfig {
            data_source_url: Some("myUrl".to_string()),
            data_source_password: Some("myPassword".to_string()),
            data_source_user_name: Some("myUserName".to_string()),
            data_source_driver_class_name: Some("myClassName".to_string()),
            application_name: Some("fooTest".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let req = build_launch_request(&cfg, &hello()).unwrap();
        let expected = BTreeMap::from([
            (datasource::URL.to_string(), "myUrl".to_string()),
            (datasource::USERNAME.to_string(), "myUserName".to_string()),
            (datasource::PASSWORD.to_string(), "myPassword".to_string()),
            (
                datasource::DRIVER_CLASS_NAME.to_string(),
                "myClassName".to_string(),
            ),
        ]);
        assert_eq!(req.environment_properties, expected);
    }

    #[test]
    fn datasource_fields_override_parsed_environment() {
        let cfg = TransformConfig {
            environment_properties: Some(
                "spring.datasource.url=old,spring.datasource.username=keep,other=1".to_string(),
            ),
            data_source_url: Some("new".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let env = build_launch_request(&cfg, &hello())
            .unwrap()
            .environment_properties;
        assert_eq!(env[datasource::URL], "new");
        assert_eq!(env[datasource::USERNAME], "keep");
        assert_eq!(env["other"], "1");
        assert_eq!(env.len(), 3);
    }

    #[test]
    fn deployment_properties_are_parsed() {
        let cfg = TransformConfig {
            deployment_properties: Some(
                "app.wow.hello=world,app.wow.foo=bar,app.wow.test=a=b,c=d,e=\"baz=bbb,nnn=mmm\""
                    .to_string(),
            ),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let req = build_launch_request(&cfg, &hello()).unwrap();
        let expected: BTreeMap<String, String> = [
            ("app.wow.hello", "world"),
            ("app.wow.foo", "bar"),
            ("app.wow.test", "a=b"),
            ("c", "d"),
            ("e", "\"baz=bbb,nnn=mmm\""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(req.deployment_properties, expected);
        assert!(req.environment_properties.is_empty());
    }

    #[test]
    fn command_line_arguments_are_split() {
        let cfg = TransformConfig {
            command_line_arguments: Some("--hello=world --foo=bar".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let req = build_launch_request(&cfg, &hello()).unwrap();
        assert_eq!(req.command_line_arguments, vec!["--hello=world", "--foo=bar"]);
    }

    #[test]
    fn malformed_environment_properties_are_rejected() {
        let cfg = TransformConfig {
            environment_properties: Some("novalue".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let err = build_launch_request(&cfg, &hello()).unwrap_err();
        assert_eq!(
            err,
            BuildError::MalformedPropertyString {
                field: fields::ENVIRONMENT_PROPERTIES,
                source: PropertyParseError::MissingSeparator {
                    segment: "novalue".to_string()
                },
            }
        );
    }

    #[test]
    fn missing_uri_wins_over_malformed_properties() {
        let cfg = TransformConfig {
            deployment_properties: Some("broken".to_string()),
            ..TransformConfig::default()
        };
        assert_eq!(
            build_launch_request(&cfg, &hello()).unwrap_err(),
            BuildError::MissingUri
        );
    }

    #[test]
    fn transform_sets_json_content_type_and_keeps_headers() {
        let cfg = TransformConfig {
            application_name: Some("fooTest".to_string()),
            ..TransformConfig::with_uri(DEFAULT_URI)
        };
        let msg = hello()
            .with_header("correlationId", "abc")
            .with_header(headers::CONTENT_TYPE, "text/plain");
        let out = transform(&cfg, &msg).unwrap();
        assert_eq!(out.content_type(), Some(APPLICATION_JSON));
        assert_eq!(out.headers["correlationId"], "abc");

        let req: LaunchRequest = serde_json::from_str(&out.payload).unwrap();
        assert_eq!(req, build_launch_request(&cfg, &msg).unwrap());
    }

    #[test]
    fn transform_propagates_rejection() {
        assert_eq!(
            transform(&TransformConfig::default(), &hello()).unwrap_err(),
            BuildError::MissingUri
        );
    }

    proptest! {
        /// Any non-empty URI is copied exactly, whatever the payload.
        #[test]
        fn prop_uri_is_copied(uri in ".{1,40}", payload in ".{0,40}") {
            let cfg = TransformConfig::with_uri(uri.clone());
            let req = build_launch_request(&cfg, &IncomingMessage::new(payload)).unwrap();
            prop_assert_eq!(req.uri, uri);
        }

        /// Without a URI every payload is rejected.
        #[test]
        fn prop_missing_uri_always_rejected(payload in ".{0,40}") {
            let err = build_launch_request(&TransformConfig::default(), &IncomingMessage::new(payload));
            prop_assert_eq!(err, Err(BuildError::MissingUri));
        }
    }
}
