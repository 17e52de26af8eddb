//! Job-scoped context shared by the steps of one invocation.

use crate::command::{self, AnnotationProperties, Command};
use crate::env::Env;
use crate::error::{Result, ToolkitError};
use crate::summary::Summary;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Options for [`Job::input`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputOptions {
    /// Fail when the input is missing or empty.
    pub required: bool,

    /// Trim leading and trailing whitespace.
    pub trim_whitespace: bool,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self {
            required: false,
            trim_whitespace: true,
        }
    }
}

impl InputOptions {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }
}

/// Environment variable holding the value of input `name`.
pub fn input_var(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// The host interface of one job: inputs, outputs, exported variables,
/// log lines, the failure signal and the job summary.
///
/// Workflow commands and log lines go to `out`, which is stdout for a real
/// run and a buffer in tests.
#[derive(Debug)]
pub struct Job<W: Write = io::Stdout> {
    env: Env,
    out: W,
    outputs: BTreeMap<String, String>,
    exported: BTreeMap<String, String>,
    failure: Option<String>,
    summary: Summary,
}

impl Job<io::Stdout> {
    /// Job writing to the process stdout.
    pub fn new(env: Env) -> Self {
        Self::with_writer(env, io::stdout())
    }
}

impl<W: Write> Job<W> {
    /// Job writing commands and log lines to `out`.
    pub fn with_writer(env: Env, out: W) -> Self {
        Self {
            env,
            out,
            outputs: BTreeMap::new(),
            exported: BTreeMap::new(),
            failure: None,
            summary: Summary::new(),
        }
    }

    /// The environment as seen by this job, including exported variables.
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// The log writer.
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Read input `name`. Absent inputs read as the empty string.
    pub fn input(&self, name: &str, opts: InputOptions) -> Result<String> {
        let value = self.env.get(&input_var(name)).unwrap_or_default();

        if opts.required && value.is_empty() {
            return Err(ToolkitError::MissingInput(name.to_string()));
        }

        Ok(if opts.trim_whitespace {
            value.trim().to_string()
        } else {
            value.to_string()
        })
    }

    /// Publish an output for later steps.
    pub fn set_output(&mut self, name: &str, value: &str) -> Result<()> {
        match self.env.path("GITHUB_OUTPUT") {
            Some(path) => {
                command::issue_file_command(&path, &command::prepare_key_value(name, value)?)?
            }
            None => self.issue(Command::new("set-output", value).with_property("name", name))?,
        }

        tracing::debug!(name, value, "Set output");
        self.outputs.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Outputs published so far.
    pub fn outputs(&self) -> &BTreeMap<String, String> {
        &self.outputs
    }

    /// Export a variable to the rest of the job.
    ///
    /// The variable is visible through [`Job::env`] immediately and to later
    /// steps through the runner's env file.
    pub fn export_variable(&mut self, name: &str, value: &str) -> Result<()> {
        match self.env.path("GITHUB_ENV") {
            Some(path) => {
                command::issue_file_command(&path, &command::prepare_key_value(name, value)?)?
            }
            None => self.issue(Command::new("set-env", value).with_property("name", name))?,
        }

        tracing::debug!(name, value, "Exported variable");
        self.env.set(name, value);
        self.exported.insert(name.to_string(), value.to_string());
        Ok(())
    }

    /// Variables exported so far.
    pub fn exported(&self) -> &BTreeMap<String, String> {
        &self.exported
    }

    /// Write a plain log line.
    pub fn info(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}").map_err(|e| ToolkitError::io("<stdout>", e))
    }

    /// Debug message, shown only when step debugging is enabled.
    pub fn debug(&mut self, message: &str) -> Result<()> {
        self.issue(Command::new("debug", message))
    }

    pub fn notice(&mut self, message: &str, props: &AnnotationProperties) -> Result<()> {
        self.issue(Command::new("notice", message).with_annotation(props))
    }

    pub fn warning(&mut self, message: &str, props: &AnnotationProperties) -> Result<()> {
        self.issue(Command::new("warning", message).with_annotation(props))
    }

    pub fn error(&mut self, message: &str, props: &AnnotationProperties) -> Result<()> {
        self.issue(Command::new("error", message).with_annotation(props))
    }

    /// Mark the job failed and log `message` as an error.
    ///
    /// Never fails: if the error line cannot be written the job is still
    /// marked failed.
    pub fn set_failed(&mut self, message: &str) {
        tracing::error!(reason = message, "Step failed");
        if let Err(e) = self.error(message, &AnnotationProperties::default()) {
            tracing::error!(error = %e, "Failed to report failure");
        }
        self.failure = Some(message.to_string());
    }

    /// The failure message, if [`Job::set_failed`] was called.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Process exit status the runner expects.
    pub fn exit_code(&self) -> i32 {
        if self.failure.is_some() {
            1
        } else {
            0
        }
    }

    /// The job summary buffer.
    pub fn summary(&mut self) -> &mut Summary {
        &mut self.summary
    }

    /// Write the buffered summary to `$GITHUB_STEP_SUMMARY`.
    pub fn write_summary(&mut self, overwrite: bool) -> Result<()> {
        let path = self
            .env
            .path("GITHUB_STEP_SUMMARY")
            .ok_or(ToolkitError::MissingEnvFile {
                var: "GITHUB_STEP_SUMMARY",
                feature: "job summaries",
            })?;
        self.summary.write(&path, overwrite)
    }

    fn issue(&mut self, cmd: Command) -> Result<()> {
        writeln!(self.out, "{cmd}").map_err(|e| ToolkitError::io("<stdout>", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(env: Env) -> Job<Vec<u8>> {
        Job::with_writer(env, Vec::new())
    }

    fn log(job: &Job<Vec<u8>>) -> String {
        String::from_utf8(job.writer().clone()).unwrap()
    }

    #[test]
    fn test_input_var_name() {
        assert_eq!(input_var("who_to_greet"), "INPUT_WHO_TO_GREET");
        assert_eq!(input_var("message prefix"), "INPUT_MESSAGE_PREFIX");
    }

    #[test]
    fn test_input_trim_and_absent() {
        let job = job(Env::new().with("INPUT_WHO_TO_GREET", "  Mona  "));

        assert_eq!(job.input("who_to_greet", InputOptions::default()).unwrap(), "Mona");
        assert_eq!(
            job.input(
                "who_to_greet",
                InputOptions {
                    trim_whitespace: false,
                    ..InputOptions::default()
                }
            )
            .unwrap(),
            "  Mona  "
        );
        assert_eq!(job.input("message_prefix", InputOptions::default()).unwrap(), "");
    }

    #[test]
    fn test_required_input_missing() {
        let job = job(Env::new());
        let err = job.input("who_to_greet", InputOptions::required()).unwrap_err();

        assert_eq!(err.to_string(), "Input required and not supplied: who_to_greet");
    }

    #[test]
    fn test_set_output_without_file_uses_command() {
        let mut job = job(Env::new());
        job.set_output("greeting-message", "Hello World!").unwrap();

        assert_eq!(log(&job), "::set-output name=greeting-message::Hello World!\n");
        assert_eq!(
            job.outputs().get("greeting-message").map(String::as_str),
            Some("Hello World!")
        );
    }

    #[test]
    fn test_set_output_with_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut job = job(Env::new().with("GITHUB_OUTPUT", file.path().to_string_lossy()));

        job.set_output("time", "09:30:00").unwrap();

        assert_eq!(log(&job), "");
        let records = command::read_file_command(file.path()).unwrap();
        assert_eq!(records.get("time").map(String::as_str), Some("09:30:00"));
    }

    #[test]
    fn test_export_variable_updates_env() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut job = job(Env::new().with("GITHUB_ENV", file.path().to_string_lossy()));

        job.export_variable("CUSTOM_GREETING", "Hi there!").unwrap();

        assert_eq!(job.env().get("CUSTOM_GREETING"), Some("Hi there!"));
        let records = command::read_file_command(file.path()).unwrap();
        assert_eq!(records.get("CUSTOM_GREETING").map(String::as_str), Some("Hi there!"));
    }

    #[test]
    fn test_export_variable_without_file_uses_command() {
        let mut job = job(Env::new());
        job.export_variable("CUSTOM_GREETING", "Hi").unwrap();

        assert_eq!(log(&job), "::set-env name=CUSTOM_GREETING::Hi\n");
    }

    #[test]
    fn test_annotations() {
        let mut job = job(Env::new());
        job.info("plain").unwrap();
        job.notice("done", &AnnotationProperties::default()).unwrap();
        job.warning("careful", &AnnotationProperties::titled("Heads up")).unwrap();
        job.debug("detail").unwrap();

        assert_eq!(
            log(&job),
            "plain\n::notice::done\n::warning title=Heads up::careful\n::debug::detail\n"
        );
    }

    #[test]
    fn test_set_failed() {
        let mut job = job(Env::new());
        assert_eq!(job.exit_code(), 0);

        job.set_failed("boom");

        assert_eq!(job.failure(), Some("boom"));
        assert_eq!(job.exit_code(), 1);
        assert_eq!(log(&job), "::error::boom\n");
    }

    #[test]
    fn test_write_summary_without_variable() {
        let mut job = job(Env::new());
        job.summary().add_raw("x", false);

        let err = job.write_summary(false).unwrap_err();
        assert!(err.to_string().contains("$GITHUB_STEP_SUMMARY"));
    }
}
