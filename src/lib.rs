//! # greet-action
//!
//! A GitHub Actions step that greets someone.
//!
//! Reads the `who_to_greet` and `message_prefix` inputs, publishes the
//! `time` and `greeting-message` outputs, exports `CUSTOM_GREETING` and
//! appends a table to the job summary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use greet_action::{greeter, Env, Job};
//!
//! let mut job = Job::new(Env::from_process());
//! greeter::run(&mut job);
//! std::process::exit(job.exit_code());
//! ```
//!
//! ## Workflow usage
//!
//! ```yaml
//! steps:
//!   - uses: ./
//!     id: greet
//!     with:
//!       who_to_greet: Mona
//!       message_prefix: Hi
//!   - run: echo "${{ steps.greet.outputs.greeting-message }} / $CUSTOM_GREETING"
//! ```

pub mod command;
mod context;
mod env;
mod error;
pub mod greeter;
mod job;
pub mod metadata;
mod summary;

pub use command::{read_file_command, AnnotationProperties};
pub use context::{EventPayload, GitHubContext, PullRequest, Repo};
pub use env::Env;
pub use error::{Result, ToolkitError};
pub use greeter::{Greeting, Inputs, Outcome};
pub use job::{input_var, InputOptions, Job};
pub use metadata::{parse_metadata, ActionMetadata};
pub use summary::{Summary, TableCell};
