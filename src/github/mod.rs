//! Pull request access through the `gh` CLI.

use crate::{
    constants::PR_JSON_FIELDS,
    errors::{HgError, HgResult},
    git::run::command_line,
};
use nu_ansi_term::Color;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

pub mod pr_body;

/// The state of a pull request, as reported by `gh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Closed,
    Merged,
    #[default]
    #[serde(other)]
    Unknown,
}

/// The subset of a pull request `hgg` works with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub number: u64,
    #[serde(default)]
    pub state: PrState,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub base_ref_name: String,
    #[serde(default)]
    pub head_ref_name: String,
    #[serde(default)]
    pub body: String,
}

impl PullRequest {
    /// Stand-in for the PR of a branch excluded from submission. Only its head is known.
    pub fn ignored(branch: &str) -> Self {
        Self {
            head_ref_name: branch.to_string(),
            ..Default::default()
        }
    }

    /// Whether this is a real PR rather than an [PullRequest::ignored] placeholder.
    pub fn exists(&self) -> bool {
        self.number != 0
    }

    fn normalized(mut self) -> Self {
        self.body = self.body.replace("\r\n", "\n");
        self
    }
}

/// Formats a PR number as a `#<n>` reference.
pub fn pr_ref(number: u64) -> String {
    format!("#{}", number)
}

/// Extracts the PR number from either `#<n>` or a PR URL.
///
/// ## Returns
/// - `None` if the reference is empty or does not end in a number.
pub fn pr_number_from_ref(reference: &str) -> Option<u64> {
    let reference = reference.trim();
    let digits = match reference.strip_prefix('#') {
        Some(digits) => digits,
        None => reference.rsplit('/').next()?,
    };
    digits.parse().ok().filter(|n| *n != 0)
}

/// Thin client over the `gh` binary.
///
/// Lookups of the open PR of a branch are cached for the lifetime of the client, which is one
/// command invocation.
#[derive(Debug, Default)]
pub struct GhClient {
    branch_prs: HashMap<String, Option<PullRequest>>,
}

impl GhClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the open PR whose head is `branch`, if any.
    pub async fn pr_for_branch(&mut self, branch: &str) -> HgResult<Option<PullRequest>> {
        if let Some(cached) = self.branch_prs.get(branch) {
            return Ok(cached.clone());
        }
        let out = gh(&["pr", "list", "-s", "open", "-H", branch, "--json", PR_JSON_FIELDS]).await?;
        let pr = serde_json::from_str::<Vec<PullRequest>>(&out)?
            .into_iter()
            .next()
            .map(PullRequest::normalized);
        self.branch_prs.insert(branch.to_string(), pr.clone());
        Ok(pr)
    }

    /// Fetches a PR by number or URL, whatever its state.
    pub async fn pr_by_ref(&self, reference: &str) -> HgResult<PullRequest> {
        let out = gh(&["pr", "view", reference, "--json", PR_JSON_FIELDS]).await?;
        Ok(serde_json::from_str::<PullRequest>(&out)?.normalized())
    }

    /// Creates a PR and returns its URL.
    pub async fn create_pr(
        &mut self,
        head: &str,
        title: &str,
        body: &str,
        base: Option<&str>,
        draft: bool,
    ) -> HgResult<String> {
        let mut args = vec!["pr", "create", "--head", head, "--title", title, "--body", body];
        if let Some(base) = base {
            args.extend(["--base", base]);
        }
        if draft {
            args.push("--draft");
        }
        let url = gh(&args).await?.trim_end().to_string();
        self.branch_prs.remove(head);
        Ok(url)
    }

    /// Edits the PR identified by `target` (a branch, number or URL) with raw `gh pr edit` flags.
    pub async fn edit_pr(&mut self, target: &str, flags: &[&str]) -> HgResult<()> {
        let mut args = vec!["pr", "edit", target];
        args.extend_from_slice(flags);
        gh(&args).await?;
        self.branch_prs.clear();
        Ok(())
    }

    /// Checks out the PR identified by `reference` into a local branch, streaming `gh`'s output.
    pub async fn checkout(&self, reference: &str) -> HgResult<()> {
        let args = ["pr", "checkout", reference];
        let line = command_line("gh", &args);
        println!("{}", Color::DarkGray.paint(format!("+ {}", line)));
        debug!(command = %line, "Running (streamed)");
        let status = Command::new("gh").args(args).status().await?;
        if !status.success() {
            return Err(HgError::CommandFailed {
                command: line,
                stderr: String::new(),
            });
        }
        Ok(())
    }
}

/// Runs `gh` with `args` and returns its stdout, failing on a non-zero exit.
async fn gh(args: &[&str]) -> HgResult<String> {
    let line = command_line("gh", args);
    debug!(command = %line, "Running");
    let output = Command::new("gh").args(args).output().await?;
    if !output.status.success() {
        return Err(HgError::CommandFailed {
            command: line,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod test {
    use super::{pr_number_from_ref, pr_ref, PrState, PullRequest};

    #[test]
    fn deserializes_gh_json() {
        let json = r#"[{
            "url": "https://github.com/acme/widgets/pull/42",
            "number": 42,
            "state": "MERGED",
            "title": "Add widgets",
            "baseRefName": "main",
            "headRefName": "widgets",
            "body": "line 1\r\nline 2"
        }]"#;
        let prs = serde_json::from_str::<Vec<PullRequest>>(json).unwrap();
        let pr = prs[0].clone().normalized();
        assert_eq!(pr.number, 42);
        assert_eq!(pr.state, PrState::Merged);
        assert_eq!(pr.base_ref_name, "main");
        assert_eq!(pr.head_ref_name, "widgets");
        assert_eq!(pr.body, "line 1\nline 2");
        assert!(pr.exists());
    }

    #[test]
    fn unknown_state_is_tolerated() {
        let pr = serde_json::from_str::<PullRequest>(r#"{"number": 1, "state": "DRAFTY"}"#).unwrap();
        assert_eq!(pr.state, PrState::Unknown);
        assert!(serde_json::from_str::<Vec<PullRequest>>("[]").unwrap().is_empty());
    }

    #[test]
    fn pr_references() {
        assert_eq!(pr_number_from_ref("#17"), Some(17));
        assert_eq!(pr_number_from_ref(" https://github.com/acme/widgets/pull/17 "), Some(17));
        assert_eq!(pr_number_from_ref(""), None);
        assert_eq!(pr_number_from_ref("#"), None);
        assert_eq!(pr_number_from_ref("https://github.com/acme/widgets/pull/"), None);
        assert_eq!(pr_ref(17), "#17");
    }

    #[test]
    fn ignored_placeholder() {
        let pr = PullRequest::ignored("vendored");
        assert_eq!(pr.head_ref_name, "vendored");
        assert!(!pr.exists());
    }
}
