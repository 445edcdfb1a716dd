//! Static transform configuration and the checks run on it at startup.

use serde::Deserialize;

use crate::error::BuildError;
use crate::properties::parse_properties;

/// Environment keys written from the datasource override fields.
pub mod datasource {
    pub const URL: &str = "spring.datasource.url";
    pub const USERNAME: &str = "spring.datasource.username";
    pub const PASSWORD: &str = "spring.datasource.password";
    pub const DRIVER_CLASS_NAME: &str = "spring.datasource.driver-class-name";
}

/// Environment variable prefix adapters use when loading a
/// [`TransformConfig`] with `envy` (e.g. `TASKLAUNCHREQUEST_URI`).
pub const ENV_PREFIX: &str = "TASKLAUNCHREQUEST_";

/// Static transform configuration, resolved once at process start.
///
/// Every field is optional so a partially configured process can still
/// start; a missing `uri` only surfaces when a message is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransformConfig {
    /// Artifact URI of the task to launch (required to build).
    #[serde(default)]
    pub uri: Option<String>,

    /// Application name; a `Task-<uuid>` name is generated when absent.
    #[serde(default)]
    pub application_name: Option<String>,

    /// Space-separated command-line arguments.
    #[serde(default)]
    pub command_line_arguments: Option<String>,

    /// `key=value,...` deployment properties.
    #[serde(default)]
    pub deployment_properties: Option<String>,

    /// `key=value,...` environment properties.
    #[serde(default)]
    pub environment_properties: Option<String>,

    #[serde(default)]
    pub data_source_url: Option<String>,

    #[serde(default)]
    pub data_source_user_name: Option<String>,

    /// Never logged.
    #[serde(default)]
    pub data_source_password: Option<String>,

    #[serde(default)]
    pub data_source_driver_class_name: Option<String>,
}

impl TransformConfig {
    /// Config with only the launch URI set.
    #[must_use]
    pub fn with_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            ..Self::default()
        }
    }

    /// Datasource overrides that are set, paired with their environment key.
    pub(crate) fn datasource_overrides(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (datasource::URL, &self.data_source_url),
            (datasource::USERNAME, &self.data_source_user_name),
            (datasource::PASSWORD, &self.data_source_password),
            (datasource::DRIVER_CLASS_NAME, &self.data_source_driver_class_name),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    /// Problems that will make every build fail with this configuration.
    ///
    /// Adapters log these at startup; messages are still rejected one by
    /// one when they arrive.
    #[must_use]
    pub fn diagnose(&self) -> Vec<BuildError> {
        let mut problems = Vec::new();
        if self.uri.as_deref().is_none_or(str::is_empty) {
            problems.push(BuildError::MissingUri);
        }
        for (field, raw) in [
            (fields::DEPLOYMENT_PROPERTIES, &self.deployment_properties),
            (fields::ENVIRONMENT_PROPERTIES, &self.environment_properties),
        ] {
            if let Some(raw) = raw
                && let Err(source) = parse_properties(raw)
            {
                problems.push(BuildError::MalformedPropertyString { field, source });
            }
        }
        problems
    }
}

/// Field names reported in [`BuildError::MalformedPropertyString`].
pub mod fields {
    pub const DEPLOYMENT_PROPERTIES: &str = "deploymentProperties";
    pub const ENVIRONMENT_PROPERTIES: &str = "environmentProperties";
}
