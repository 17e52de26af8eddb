//! Errors raised by the toolkit layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while talking to the host runner.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// A required input was empty or missing.
    #[error("Input required and not supplied: {0}")]
    MissingInput(String),

    /// The environment variable pointing at a runner file is not set.
    #[error("Unable to find environment variable for ${var}. Check if your runtime environment supports {feature}.")]
    MissingEnvFile { var: &'static str, feature: &'static str },

    /// Reading or writing a runner file failed.
    #[error("Failed to access file {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file-command key or value collides with the generated delimiter.
    #[error("Unexpected input: {field} should not contain the delimiter \"{delimiter}\"")]
    Delimiter { field: &'static str, delimiter: String },

    /// A file-command file could not be parsed.
    #[error("Malformed file command in {}: {reason}", .path.display())]
    MalformedFileCommand { path: PathBuf, reason: String },

    /// Neither `GITHUB_REPOSITORY` nor the payload names a repository.
    #[error("context.repo requires a GITHUB_REPOSITORY environment variable like 'owner/repo'")]
    MissingRepository,

    /// The event payload file is not valid JSON.
    #[error("Failed to parse event payload {}", .path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A summary template failed to render.
    #[error("Failed to render summary")]
    Render(#[from] handlebars::RenderError),
}

impl ToolkitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for toolkit operations.
pub type Result<T, E = ToolkitError> = std::result::Result<T, E>;
