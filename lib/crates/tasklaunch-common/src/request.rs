//! The launch request record and its JSON field names.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix for application names generated when none is configured.
pub const GENERATED_NAME_PREFIX: &str = "Task-";

/// A request describing which task artifact to launch and how.
///
/// Built fresh for every inbound message and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchRequest {
    /// Artifact URI of the task to launch. Never empty.
    pub uri: String,
    pub application_name: String,
    #[serde(rename = "commandlineArguments", default)]
    pub command_line_arguments: Vec<String>,
    #[serde(default)]
    pub environment_properties: BTreeMap<String, String>,
    #[serde(default)]
    pub deployment_properties: BTreeMap<String, String>,
}

/// Generate a unique-enough application name, e.g. `Task-3f2a…`.
///
/// Uniqueness is an operational convenience only; nothing relies on it.
#[must_use]
pub fn generate_application_name() -> String {
    format!("{GENERATED_NAME_PREFIX}{}", uuid::Uuid::new_v4().simple())
}
