use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use greet_action::{greeter, input_var, metadata, Env, Job};
use tracing_subscriber::EnvFilter;

/// Greet someone from a GitHub Actions workflow.
///
/// Inside a runner every input comes from the `INPUT_*` environment
/// variables. For local runs, pass `--action action.yml` to pick up the
/// declared input defaults, or set the inputs directly.
#[derive(Debug, Parser)]
#[command(name = "greet-action")]
#[command(version)]
#[command(about = "Greet someone from a GitHub Actions workflow")]
struct Cli {
    /// Action metadata whose input defaults fill in missing inputs.
    #[arg(long, value_name = "PATH")]
    action: Option<PathBuf>,

    /// Override the `who_to_greet` input.
    #[arg(long, value_name = "NAME")]
    who_to_greet: Option<String>,

    /// Override the `message_prefix` input.
    #[arg(long, value_name = "PREFIX")]
    message_prefix: Option<String>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let job = run(&cli, Env::from_process(), io::stdout());

    if job.failure().is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Apply the command-line overrides, then the declared input defaults for
/// anything still missing.
fn build_env(cli: &Cli, mut env: Env) -> anyhow::Result<Env> {
    if let Some(ref name) = cli.who_to_greet {
        env.set(input_var(greeter::INPUT_WHO_TO_GREET), name.clone());
    }
    if let Some(ref prefix) = cli.message_prefix {
        env.set(input_var(greeter::INPUT_MESSAGE_PREFIX), prefix.clone());
    }

    if let Some(ref path) = cli.action {
        metadata::load_file(path)?.apply_defaults(&mut env);
    }

    Ok(env)
}

/// Run the step, reporting a bad metadata file as the step's failure.
fn run<W: Write>(cli: &Cli, env: Env, out: W) -> Job<W> {
    match build_env(cli, env.clone()) {
        Ok(env) => {
            let mut job = Job::with_writer(env, out);
            greeter::run(&mut job);
            job
        }
        Err(err) => {
            let mut job = Job::with_writer(env, out);
            job.set_failed(&format!("❌ Action 執行失敗: {err:#}"));
            job
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTION_YML: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/action.yml");

    fn log(job: &Job<Vec<u8>>) -> String {
        String::from_utf8(job.writer().clone()).unwrap()
    }

    #[test]
    fn test_overrides_beat_action_defaults() {
        let cli = Cli::parse_from(["greet-action", "--action", ACTION_YML, "--who-to-greet", "Mona"]);

        let env = build_env(&cli, Env::new()).unwrap();

        assert_eq!(env.get("INPUT_WHO_TO_GREET"), Some("Mona"));
        assert_eq!(env.get("INPUT_MESSAGE_PREFIX"), Some("Hello"));
    }

    #[test]
    fn test_runner_inputs_beat_action_defaults() {
        let cli = Cli::parse_from(["greet-action", "--action", ACTION_YML]);
        let env = Env::new().with("INPUT_MESSAGE_PREFIX", "Hi");

        let env = build_env(&cli, env).unwrap();

        assert_eq!(env.get("INPUT_WHO_TO_GREET"), Some("World"));
        assert_eq!(env.get("INPUT_MESSAGE_PREFIX"), Some("Hi"));
    }

    #[test]
    fn test_bad_action_path_fails_once() {
        let cli = Cli::parse_from(["greet-action", "--action", "/nonexistent/action.yml"]);

        let job = run(&cli, Env::new(), Vec::new());

        assert_eq!(job.exit_code(), 1);
        assert!(job.failure().unwrap().contains("/nonexistent/action.yml"));
        assert_eq!(log(&job).matches("::error::").count(), 1);
        assert!(job.outputs().is_empty());
    }
}
