//! `tasklaunch properties`: show how a property string parses.

use anyhow::{Context, Result};
use clap::Args;

use tasklaunch_common::parse_properties;

/// Arguments for `tasklaunch properties`.
#[derive(Args, Debug)]
pub struct PropertiesArgs {
    /// Property string, e.g. 'a=b,e="x=y,z"'
    #[arg(allow_hyphen_values = true)]
    pub raw: String,
}

/// Parse the property string and print it as a pretty JSON object.
///
/// # Errors
///
/// Returns an error if the string is malformed.
pub fn run(args: &PropertiesArgs) -> Result<()> {
    println!("{}", render(&args.raw)?);
    Ok(())
}

fn render(raw: &str) -> Result<String> {
    let parsed = parse_properties(raw).context("invalid property string")?;
    serde_json::to_string_pretty(&parsed).context("JSON serialization failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sorted_object() {
        let json = render("c=d,a=b").expect("render");
        let value: serde_json::Value = serde_json::from_str(&json).expect("json");
        assert_eq!(value["a"], "b");
        assert_eq!(value["c"], "d");
        assert!(json.find("\"a\"") < json.find("\"c\""));
    }

    #[test]
    fn empty_string_renders_empty_object() {
        assert_eq!(render("").expect("render"), "{}");
    }

    #[test]
    fn malformed_string_is_an_error() {
        let err = render("a=b,nope").expect_err("must fail");
        assert!(format!("{err:#}").contains("nope"));
    }
}
