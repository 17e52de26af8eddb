//! Workflow commands and file commands understood by the runner.
//!
//! Workflow commands are stdout lines of the form `::name key=value::message`.
//! File commands are `KEY<<DELIMITER` records appended to a file the runner
//! points at through an environment variable (`GITHUB_OUTPUT`, `GITHUB_ENV`).

use crate::error::{Result, ToolkitError};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// A workflow command ready to be printed on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: String,
    properties: Vec<(String, String)>,
    message: String,
}

impl Command {
    /// Create a command with no properties.
    pub fn new(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            properties: Vec::new(),
            message: message.into(),
        }
    }

    /// Add a property. Properties keep insertion order.
    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.properties.push((key.to_string(), value.into()));
        self
    }

    /// Add all properties of an annotation.
    pub fn with_annotation(mut self, props: &AnnotationProperties) -> Self {
        self.properties.extend(props.to_properties());
        self
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "::{}", self.name)?;
        if !self.properties.is_empty() {
            let props = self
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, escape_property(v)))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, " {}", props)?;
        }
        write!(f, "::{}", escape_data(&self.message))
    }
}

/// Optional location and title attached to `notice`, `warning` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationProperties {
    pub title: Option<String>,
    pub file: Option<String>,
    pub start_line: Option<u32>,
    pub end_line: Option<u32>,
    pub start_column: Option<u32>,
    pub end_column: Option<u32>,
}

impl AnnotationProperties {
    /// Annotation with only a title.
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    fn to_properties(&self) -> Vec<(String, String)> {
        let numbered = [
            ("line", self.start_line),
            ("endLine", self.end_line),
            ("col", self.start_column),
            ("endColumn", self.end_column),
        ];

        let mut props = Vec::new();
        if let Some(ref title) = self.title {
            props.push(("title".to_string(), title.clone()));
        }
        if let Some(ref file) = self.file {
            props.push(("file".to_string(), file.clone()));
        }
        for (key, value) in numbered {
            if let Some(value) = value {
                props.push((key.to_string(), value.to_string()));
            }
        }
        props
    }
}

/// Escape a command message.
pub fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Escape a command property value.
pub fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}

/// Format a `KEY<<DELIMITER` record with a fresh random delimiter.
pub fn prepare_key_value(key: &str, value: &str) -> Result<String> {
    let delimiter = format!("ghadelimiter_{}", uuid::Uuid::new_v4());
    prepare_key_value_with(key, value, &delimiter)
}

fn prepare_key_value_with(key: &str, value: &str, delimiter: &str) -> Result<String> {
    if key.contains(delimiter) {
        return Err(ToolkitError::Delimiter {
            field: "name",
            delimiter: delimiter.to_string(),
        });
    }
    if value.contains(delimiter) {
        return Err(ToolkitError::Delimiter {
            field: "value",
            delimiter: delimiter.to_string(),
        });
    }

    Ok(format!("{key}<<{delimiter}\n{value}\n{delimiter}"))
}

/// Append a prepared record to a file-command file.
pub fn issue_file_command(path: &Path, message: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| ToolkitError::io(path, e))?;

    writeln!(file, "{message}").map_err(|e| ToolkitError::io(path, e))
}

/// Read every record of a file-command file.
///
/// Accepts both the `KEY<<DELIMITER` heredoc form and plain `KEY=VALUE`
/// lines. Later records win over earlier ones with the same key.
pub fn read_file_command(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ToolkitError::io(path, e))?;
    parse_file_command(&content).map_err(|reason| ToolkitError::MalformedFileCommand {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_file_command(content: &str) -> std::result::Result<BTreeMap<String, String>, String> {
    let mut records = BTreeMap::new();
    let mut lines = content.lines().map(|l| l.strip_suffix('\r').unwrap_or(l));

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        if let Some((key, delimiter)) = line.split_once("<<") {
            let mut value_lines = Vec::new();
            loop {
                match lines.next() {
                    Some(l) if l == delimiter => break,
                    Some(l) => value_lines.push(l),
                    None => return Err(format!("missing delimiter {delimiter} for {key}")),
                }
            }
            records.insert(key.to_string(), value_lines.join("\n"));
        } else if let Some((key, value)) = line.split_once('=') {
            records.insert(key.to_string(), value.to_string());
        } else {
            return Err(format!("invalid line: {line}"));
        }
    }

    Ok(records)
}
