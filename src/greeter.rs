//! The greeting step.

use crate::command::AnnotationProperties;
use crate::context::GitHubContext;
use crate::job::{InputOptions, Job};
use crate::summary::TableCell;
use anyhow::{Context as _, Result};
use chrono::{DateTime, FixedOffset, Local};
use std::io::Write;

pub const INPUT_WHO_TO_GREET: &str = "who_to_greet";
pub const INPUT_MESSAGE_PREFIX: &str = "message_prefix";
pub const OUTPUT_TIME: &str = "time";
pub const OUTPUT_GREETING_MESSAGE: &str = "greeting-message";
pub const CUSTOM_GREETING: &str = "CUSTOM_GREETING";

const SUMMARY_HEADING: &str = "Greet Action 執行結果";

/// Inputs of the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inputs {
    pub who_to_greet: String,
    pub message_prefix: String,
}

impl Inputs {
    /// Read the inputs from the job. Missing inputs read as empty strings.
    pub fn read<W: Write>(job: &Job<W>) -> Result<Self> {
        Ok(Self {
            who_to_greet: job.input(INPUT_WHO_TO_GREET, InputOptions::default())?,
            message_prefix: job.input(INPUT_MESSAGE_PREFIX, InputOptions::default())?,
        })
    }
}

/// Values derived from the inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub who_to_greet: String,
    pub message_prefix: String,
    pub message: String,
    pub time: String,
}

impl Greeting {
    /// Compose the greeting for `inputs` at `now`.
    ///
    /// Empty inputs are allowed and produce e.g. `"Hello !"`.
    pub fn compose(inputs: Inputs, now: &DateTime<FixedOffset>) -> Self {
        let message = format!("{} {}!", inputs.message_prefix, inputs.who_to_greet);
        Self {
            who_to_greet: inputs.who_to_greet,
            message_prefix: inputs.message_prefix,
            message,
            time: format_time(now),
        }
    }

    fn summary_rows(&self) -> Vec<Vec<TableCell>> {
        vec![
            vec![TableCell::header("項目"), TableCell::header("值")],
            vec!["問候對象".into(), self.who_to_greet.clone().into()],
            vec!["訊息前綴".into(), self.message_prefix.clone().into()],
            vec!["完整訊息".into(), self.message.clone().into()],
            vec!["執行時間".into(), self.time.clone().into()],
        ]
    }
}

/// Time of day as `HH:MM:SS GMT+hhmm`, independent of the host locale.
pub fn format_time(now: &DateTime<FixedOffset>) -> String {
    now.format("%H:%M:%S GMT%z").to_string()
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded(Greeting),
    Failed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded(_))
    }
}

/// Run the step at the current local time.
///
/// Never returns an error: any failure is reported once through
/// [`Job::set_failed`] and returned as [`Outcome::Failed`].
pub fn run<W: Write>(job: &mut Job<W>) -> Outcome {
    run_at(job, Local::now().fixed_offset())
}

/// Run the step as if the current time were `now`.
pub fn run_at<W: Write>(job: &mut Job<W>, now: DateTime<FixedOffset>) -> Outcome {
    match execute(job, &now) {
        Ok(greeting) => Outcome::Succeeded(greeting),
        Err(err) => {
            let message = format!("❌ Action 執行失敗: {err:#}");
            job.set_failed(&message);
            Outcome::Failed(message)
        }
    }
}

/// The step sequence. Stops at the first failing step; outputs already
/// published stay published.
pub fn execute<W: Write>(job: &mut Job<W>, now: &DateTime<FixedOffset>) -> Result<Greeting> {
    let start = std::time::Instant::now();

    let inputs = Inputs::read(job).context("Failed to read inputs")?;
    tracing::info!(who_to_greet = %inputs.who_to_greet, "Starting greeter");
    job.info("🎉 開始執行 Greet Action...")?;

    let greeting = Greeting::compose(inputs, now);

    job.info(&format!("問候訊息: {}", greeting.message))?;
    job.info(&format!("執行時間: {}", greeting.time))?;

    job.set_output(OUTPUT_TIME, &greeting.time)
        .with_context(|| format!("Failed to set output {OUTPUT_TIME}"))?;
    job.set_output(OUTPUT_GREETING_MESSAGE, &greeting.message)
        .with_context(|| format!("Failed to set output {OUTPUT_GREETING_MESSAGE}"))?;

    let ctx = GitHubContext::from_env(job.env()).context("Failed to read run context")?;
    let repo = ctx.repo()?;
    job.info(&format!("📦 倉庫: {repo}"))?;
    job.info(&format!("🔀 事件名稱: {}", ctx.event_name))?;

    if let Some(pr) = ctx.pull_request() {
        tracing::debug!(number = ?pr.number, "Event carries a pull request");
        let number = pr.number.map_or_else(|| "unknown".to_string(), |n| n.to_string());
        job.info(&format!("🔗 PR 編號: {number}"))?;
    }

    job.notice(
        &format!("✅ Action 執行成功！問候 {}", greeting.who_to_greet),
        &AnnotationProperties::default(),
    )?;

    job.export_variable(CUSTOM_GREETING, &greeting.message)
        .with_context(|| format!("Failed to export {CUSTOM_GREETING}"))?;

    job.summary()
        .add_heading(SUMMARY_HEADING, 1)
        .add_table(greeting.summary_rows());
    job.write_summary(false)
        .context("Failed to write job summary")?;

    tracing::info!(
        greeting = %greeting.message,
        total_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Greeter completed"
    );

    Ok(greeting)
}
