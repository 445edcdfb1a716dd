//! JSON output helpers.

use anyhow::{Context, Result};
use tasklaunch_common::BuildError;

/// Format a rejected message as a single-line JSON error object.
///
/// ```json
/// {"error":true,"line":3,"code":"missing_uri","message":"..."}
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_rejection(line: usize, error: &BuildError) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "line": line,
        "code": error.code(),
        "message": error.to_string(),
    });
    serde_json::to_string(&obj).context("JSON serialization failed")
}
