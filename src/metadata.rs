//! `action.yml` metadata parser.

use crate::env::Env;
use crate::job::input_var;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Declared input of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputSpec {
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default: Option<String>,
}

/// Declared output of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputSpec {
    #[serde(default)]
    pub description: Option<String>,
}

/// How the runner starts the action.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Runs {
    pub using: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub main: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Branding {
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default)]
    pub color: Option<String>,
}

/// Parsed `action.yml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionMetadata {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub author: Option<String>,

    #[serde(default)]
    pub inputs: BTreeMap<String, InputSpec>,

    #[serde(default)]
    pub outputs: BTreeMap<String, OutputSpec>,

    pub runs: Runs,

    #[serde(default)]
    pub branding: Option<Branding>,
}

impl ActionMetadata {
    /// Fill in declared defaults for inputs missing from `env`.
    ///
    /// The runner does this itself; this is for runs outside a runner.
    pub fn apply_defaults(&self, env: &mut Env) {
        for (name, input) in &self.inputs {
            let var = input_var(name);
            if env.contains(&var) {
                continue;
            }
            if let Some(ref default) = input.default {
                tracing::debug!(input = %name, default = %default, "Using default input");
                env.set(var, default.clone());
            }
        }
    }
}

/// Parse action metadata from a YAML string.
///
/// # Example
///
/// ```rust
/// use greet_action::parse_metadata;
///
/// let yaml = r#"
/// name: greeter
/// inputs:
///   who_to_greet:
///     default: World
/// runs:
///   using: docker
///   image: Dockerfile
/// "#;
///
/// let metadata = parse_metadata(yaml).unwrap();
/// assert_eq!(metadata.name, "greeter");
/// assert_eq!(metadata.inputs.len(), 1);
/// ```
pub fn parse_metadata(yaml: &str) -> Result<ActionMetadata> {
    let metadata: ActionMetadata =
        serde_yaml::from_str(yaml).context("Failed to parse action metadata YAML")?;

    validate(&metadata)?;

    Ok(metadata)
}

/// Load and parse action metadata from a file.
pub fn load_file(path: impl AsRef<Path>) -> Result<ActionMetadata> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read action metadata: {}", path.display()))?;

    parse_metadata(&content)
        .with_context(|| format!("Failed to parse action metadata: {}", path.display()))
}

fn validate(metadata: &ActionMetadata) -> Result<()> {
    if metadata.name.is_empty() {
        anyhow::bail!("Action name cannot be empty");
    }

    if metadata.runs.using.is_empty() {
        anyhow::bail!("Action runs.using cannot be empty");
    }

    if metadata.inputs.keys().any(|k| k.is_empty()) {
        anyhow::bail!("Action has an input with an empty name");
    }

    if metadata.outputs.keys().any(|k| k.is_empty()) {
        anyhow::bail!("Action has an output with an empty name");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTION_YML: &str = include_str!("../action.yml");

    #[test]
    fn test_parse_bundled_action() {
        let metadata = parse_metadata(ACTION_YML).unwrap();

        assert_eq!(metadata.runs.using, "docker");
        assert!(metadata.inputs["who_to_greet"].required);
        assert_eq!(
            metadata.inputs["message_prefix"].default.as_deref(),
            Some("Hello")
        );
        assert!(metadata.outputs.contains_key("time"));
        assert!(metadata.outputs.contains_key("greeting-message"));
    }

    #[test]
    fn test_apply_defaults_keeps_existing() {
        let metadata = parse_metadata(ACTION_YML).unwrap();
        let mut env = Env::new().with("INPUT_WHO_TO_GREET", "Mona");

        metadata.apply_defaults(&mut env);

        assert_eq!(env.get("INPUT_WHO_TO_GREET"), Some("Mona"));
        assert_eq!(env.get("INPUT_MESSAGE_PREFIX"), Some("Hello"));
    }

    #[test]
    fn test_validate_empty_name() {
        let yaml = r#"
name: ""
runs:
  using: docker
"#;

        let result = parse_metadata(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("name cannot be empty"));
    }

    #[test]
    fn test_missing_runs() {
        let yaml = "name: greeter\n";
        assert!(parse_metadata(yaml).is_err());
    }

    #[test]
    fn test_load_file_reports_path() {
        let err = load_file("/nonexistent/action.yml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/action.yml"));
    }
}
