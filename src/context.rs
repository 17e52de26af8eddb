//! Ambient execution context supplied by the runner.

use crate::env::Env;
use crate::error::{Result, ToolkitError};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;

const DEFAULT_SERVER_URL: &str = "https://github.com";
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Repository owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub owner: String,
    pub repo: String,
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Pull request carried by `pull_request*` events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub number: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PayloadOwner {
    #[serde(default)]
    pub login: Option<String>,
}

/// Repository as described by the event payload.
///
/// Every field is optional: hand-written payloads often carry only part of
/// the webhook shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PayloadRepository {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub owner: Option<PayloadOwner>,
}

/// Webhook payload of the triggering event.
///
/// Only the fields the step inspects are typed, everything else is kept in
/// `rest`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub pull_request: Option<PullRequest>,

    #[serde(default)]
    pub repository: Option<PayloadRepository>,

    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl EventPayload {
    /// Parse a payload from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Information about the workflow run the step executes in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GitHubContext {
    pub event_name: String,
    pub payload: EventPayload,
    pub sha: String,
    pub git_ref: String,
    pub workflow: String,
    pub action: String,
    pub actor: String,
    pub job: String,
    pub run_id: u64,
    pub run_number: u64,
    pub server_url: String,
    pub api_url: String,
    pub graphql_url: String,
    repository: Option<String>,
}

impl GitHubContext {
    /// Build the context from runner environment variables.
    ///
    /// A `GITHUB_EVENT_PATH` that does not exist yields an empty payload and a
    /// warning; a file that exists but is not valid JSON is an error.
    pub fn from_env(env: &Env) -> Result<Self> {
        let payload = match env.path("GITHUB_EVENT_PATH") {
            Some(path) if path.exists() => load_payload(&path)?,
            Some(path) => {
                tracing::warn!(path = %path.display(), "GITHUB_EVENT_PATH does not exist");
                EventPayload::default()
            }
            None => EventPayload::default(),
        };

        let text = |name: &str| env.get(name).unwrap_or_default().to_string();
        let number = |name: &str| {
            env.get(name)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default()
        };
        let url = |name: &str, default: &str| {
            env.non_empty(name).unwrap_or(default).to_string()
        };

        Ok(Self {
            event_name: text("GITHUB_EVENT_NAME"),
            payload,
            sha: text("GITHUB_SHA"),
            git_ref: text("GITHUB_REF"),
            workflow: text("GITHUB_WORKFLOW"),
            action: text("GITHUB_ACTION"),
            actor: text("GITHUB_ACTOR"),
            job: text("GITHUB_JOB"),
            run_id: number("GITHUB_RUN_ID"),
            run_number: number("GITHUB_RUN_NUMBER"),
            server_url: url("GITHUB_SERVER_URL", DEFAULT_SERVER_URL),
            api_url: url("GITHUB_API_URL", DEFAULT_API_URL),
            graphql_url: url("GITHUB_GRAPHQL_URL", DEFAULT_GRAPHQL_URL),
            repository: env.non_empty("GITHUB_REPOSITORY").map(str::to_string),
        })
    }

    /// Repository the run belongs to.
    ///
    /// Taken from `GITHUB_REPOSITORY`, falling back to the payload.
    pub fn repo(&self) -> Result<Repo> {
        if let Some((owner, repo)) = self.repository.as_deref().and_then(|s| s.split_once('/')) {
            return Ok(Repo {
                owner: owner.to_string(),
                repo: repo.to_string(),
            });
        }

        self.payload
            .repository
            .as_ref()
            .and_then(|r| {
                Some(Repo {
                    owner: r.owner.as_ref()?.login.clone()?,
                    repo: r.name.clone()?,
                })
            })
            .ok_or(ToolkitError::MissingRepository)
    }

    /// The pull request of the triggering event, if it carries one.
    pub fn pull_request(&self) -> Option<&PullRequest> {
        self.payload.pull_request.as_ref()
    }
}

fn load_payload(path: &Path) -> Result<EventPayload> {
    let content = std::fs::read_to_string(path).map_err(|e| ToolkitError::io(path, e))?;
    EventPayload::from_json(&content).map_err(|source| ToolkitError::Payload {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_payload_with_pull_request() {
        let payload = EventPayload::from_json(
            r#"{"action": "opened", "pull_request": {"number": 42, "title": "Add greeting"}}"#,
        )
        .unwrap();

        assert_eq!(payload.pull_request.as_ref().and_then(|pr| pr.number), Some(42));
        assert_eq!(payload.rest.get("action"), Some(&Value::from("opened")));
    }

    #[test]
    fn test_payload_without_pull_request() {
        let payload = EventPayload::from_json(r#"{"ref": "refs/heads/main"}"#).unwrap();
        assert!(payload.pull_request.is_none());
    }

    #[test]
    fn test_from_env_reads_event_file() {
        let mut event = tempfile::NamedTempFile::new().unwrap();
        write!(event, r#"{{"pull_request": {{"number": 7}}}}"#).unwrap();

        let env = Env::new()
            .with("GITHUB_EVENT_NAME", "pull_request")
            .with("GITHUB_EVENT_PATH", event.path().to_string_lossy())
            .with("GITHUB_REPOSITORY", "octo/hello")
            .with("GITHUB_RUN_NUMBER", "12");

        let ctx = GitHubContext::from_env(&env).unwrap();

        assert_eq!(ctx.event_name, "pull_request");
        assert_eq!(ctx.pull_request().and_then(|pr| pr.number), Some(7));
        assert_eq!(ctx.run_number, 12);
        assert_eq!(ctx.server_url, "https://github.com");
        assert_eq!(ctx.repo().unwrap().to_string(), "octo/hello");
    }

    #[test]
    fn test_missing_event_file_is_empty_payload() {
        let env = Env::new().with("GITHUB_EVENT_PATH", "/nonexistent/event.json");
        let ctx = GitHubContext::from_env(&env).unwrap();

        assert_eq!(ctx.payload, EventPayload::default());
    }

    #[test]
    fn test_invalid_event_file_is_error() {
        let mut event = tempfile::NamedTempFile::new().unwrap();
        write!(event, "not json").unwrap();

        let env = Env::new().with("GITHUB_EVENT_PATH", event.path().to_string_lossy());
        let err = GitHubContext::from_env(&env).unwrap_err();

        assert!(matches!(err, ToolkitError::Payload { .. }));
    }

    #[test]
    fn test_repo_falls_back_to_payload() {
        let ctx = GitHubContext {
            payload: EventPayload::from_json(
                r#"{"repository": {"name": "hello", "owner": {"login": "octo"}}}"#,
            )
            .unwrap(),
            ..GitHubContext::default()
        };

        assert_eq!(
            ctx.repo().unwrap(),
            Repo {
                owner: "octo".to_string(),
                repo: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_partial_payload_parses() {
        let payload = EventPayload::from_json(
            r#"{"repository": {"full_name": "octo/hello"}, "pull_request": {"title": "x"}}"#,
        )
        .unwrap();

        assert_eq!(payload.pull_request, Some(PullRequest { number: None }));

        let ctx = GitHubContext {
            payload,
            ..GitHubContext::default()
        };
        assert!(matches!(ctx.repo(), Err(ToolkitError::MissingRepository)));
    }

    #[test]
    fn test_repo_owner_without_login() {
        let ctx = GitHubContext {
            payload: EventPayload::from_json(
                r#"{"repository": {"name": "hello", "owner": {"name": "octo"}}}"#,
            )
            .unwrap(),
            ..GitHubContext::default()
        };

        assert!(ctx.repo().is_err());
    }

    #[test]
    fn test_repo_missing() {
        let err = GitHubContext::default().repo().unwrap_err();
        assert!(err.to_string().contains("GITHUB_REPOSITORY"));
    }
}
