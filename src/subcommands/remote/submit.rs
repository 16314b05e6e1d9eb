//! `submit` subcommand.

use crate::{
    ctx::HggContext,
    errors::GraphError,
    git::{
        commit::CommitRecord,
        description::{set_description, BranchDescription},
        run::{command_line, git_output},
    },
    github::{
        pr_body::PrBody, pr_number_from_ref, pr_ref, GhClient, PrState, PullRequest,
    },
    tree::{
        fmt::hyperlink,
        traversal::{stack_chain, StackEntry},
        RepoData,
    },
};
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use nu_ansi_term::{Color, Style};
use std::{fmt, io::IsTerminal};
use tracing::{debug, info};

/// What happened to the pull request of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitStatus {
    Created,
    Updated,
    Skipped,
}

impl fmt::Display for SubmitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Updated => write!(f, "updated"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl SubmitStatus {
    /// A push counts as an update even when the PR itself was left alone.
    fn after_push(self, pushed: bool) -> Self {
        match (pushed, self) {
            (true, Self::Skipped) => Self::Updated,
            _ => self,
        }
    }
}

/// CLI arguments for the `submit` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SubmitCmd {
    /// Create new pull requests as drafts.
    #[clap(short = 'n', long)]
    draft: bool,
    /// Force push the branches.
    #[clap(short, long)]
    force: bool,
}

impl SubmitCmd {
    /// Run the `submit` subcommand.
    ///
    /// Pushes every branch of the current stack and creates or updates its pull request,
    /// starting from the branch closest to master.
    pub async fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let repo = ctx.load_repo_data()?;
        let current = ctx.current_branch()?;
        let stack = stack_chain(&repo, repo.require_branch(&current)?)
            .context("finding the current stack")?;
        info!(branches = stack.len(), "Submitting stack");

        let mut gh = GhClient::new();
        for entry in stack.iter().rev() {
            self.submit_branch(&ctx, &repo, &mut gh, entry)
                .await
                .with_context(|| format!("processing branch `{}`", entry.branch))?;
        }
        Ok(())
    }

    async fn submit_branch(
        &self,
        ctx: &HggContext<'_>,
        repo: &RepoData,
        gh: &mut GhClient,
        entry: &StackEntry,
    ) -> Result<()> {
        let branch = entry.branch.as_str();
        let prefix = Color::Green.paint(format!("{}: ", branch));
        if ctx.is_pr_ignored(branch)? {
            println!("{}(ignored)", prefix);
            return Ok(());
        }

        let pushed = push_branch(&ctx.config.remote, branch, self.force)
            .with_context(|| format!("pushing branch `{}`", branch))?;
        let (url, status) = self
            .create_or_update_pr(ctx, repo, gh, entry)
            .await
            .with_context(|| format!("creating or updating the PR of `{}`", branch))?;

        let text = pr_number_from_ref(&url).map(pr_ref).unwrap_or_else(|| url.clone());
        let link = if std::io::stdout().is_terminal() {
            hyperlink(&text, &url)
        } else {
            text
        };
        println!(
            "{}{} ({})",
            prefix,
            Style::new().bold().paint(link),
            status.after_push(pushed)
        );
        Ok(())
    }

    async fn create_or_update_pr(
        &self,
        ctx: &HggContext<'_>,
        repo: &RepoData,
        gh: &mut GhClient,
        entry: &StackEntry,
    ) -> Result<(String, SubmitStatus)> {
        let branch = entry.branch.as_str();
        let commit = repo
            .commit(entry.node)
            .ok_or_else(|| GraphError::UnknownBranch(branch.to_string()))?;
        let parent = repo
            .parent(entry.node)
            .and_then(|p| repo.commit(p))
            .ok_or_else(|| GraphError::NoParent(branch.to_string()))?;

        let parent_pr = if parent.is_effective_master() {
            None
        } else {
            Some(find_parent_pr(ctx, gh, parent).await?)
        };

        let description = commit.description.clone().ok_or_else(|| {
            anyhow!(
                "no branch description for branch `{}`. Add one by running `hgg edit`.",
                branch
            )
        })?;

        let existing = gh.pr_for_branch(branch).await?;
        let (url, status) = match existing {
            None => {
                let url = self
                    .create_pr(ctx, gh, branch, &description, parent_pr.as_ref())
                    .await?;
                (url, SubmitStatus::Created)
            }
            Some(pr) => {
                update_pr(gh, &repo.master_branch, branch, &pr, &description, parent_pr.as_ref())
                    .await?
            }
        };

        link_from_parent(ctx, gh, &url, parent_pr.as_ref())
            .await
            .context("adding a forward reference to the parent PR")?;

        let description = BranchDescription {
            pr_url: Some(url.clone()),
            ..description
        };
        set_description(ctx.repository, branch, &description)
            .context("recording the PR URL in the branch description")?;
        Ok((url, status))
    }

    async fn create_pr(
        &self,
        ctx: &HggContext<'_>,
        gh: &mut GhClient,
        branch: &str,
        description: &BranchDescription,
        parent_pr: Option<&PullRequest>,
    ) -> Result<String> {
        let body = PrBody {
            previous_pr: parent_pr.filter(|p| p.exists()).map(|p| p.number),
            next_prs: Vec::new(),
            description: description.body.clone(),
        };
        let draft = self.draft || ctx.config.draft;
        let url = gh
            .create_pr(
                branch,
                &description.title,
                &body.to_markdown(),
                parent_pr.map(|p| p.head_ref_name.as_str()),
                draft,
            )
            .await?;
        debug!(branch, url = %url, "Created PR");
        Ok(url)
    }
}

/// The PR a branch's PR is based on. A prignored branch without a PR stands in with a
/// placeholder.
async fn find_parent_pr(
    ctx: &HggContext<'_>,
    gh: &mut GhClient,
    parent: &CommitRecord,
) -> Result<PullRequest> {
    let branch = parent.single_branch_name()?;
    match gh.pr_for_branch(branch).await? {
        Some(pr) => Ok(pr),
        None if ctx.is_pr_ignored(branch)? => Ok(PullRequest::ignored(branch)),
        None => bail!("no PR found for parent branch `{}`", branch),
    }
}

/// Brings the base, title and body of an existing PR up to date.
async fn update_pr(
    gh: &mut GhClient,
    master: &str,
    branch: &str,
    pr: &PullRequest,
    description: &BranchDescription,
    parent_pr: Option<&PullRequest>,
) -> Result<(String, SubmitStatus)> {
    let base = parent_pr.map_or(master, |p| p.head_ref_name.as_str());
    let body = updated_body(gh, branch, pr, description, parent_pr).await?;

    let mut flags = Vec::new();
    if base != pr.base_ref_name {
        flags.extend(["--base", base]);
    }
    if description.title != pr.title {
        flags.extend(["--title", description.title.as_str()]);
    }
    if body != pr.body {
        flags.extend(["--body", body.as_str()]);
    }

    if flags.is_empty() {
        return Ok((pr.url.clone(), SubmitStatus::Skipped));
    }
    gh.edit_pr(branch, &flags).await?;
    Ok((pr.url.clone(), SubmitStatus::Updated))
}

/// The body of an existing PR with the current description and refreshed stack links.
///
/// A merged previous PR is kept, since the stack was built on it. Otherwise the previous PR
/// becomes the parent's. Next PRs no longer based on `branch` are dropped.
async fn updated_body(
    gh: &mut GhClient,
    branch: &str,
    pr: &PullRequest,
    description: &BranchDescription,
    parent_pr: Option<&PullRequest>,
) -> Result<String> {
    let mut body = PrBody::parse(&pr.body);
    body.description = description.body.clone();

    let mut previous = parent_pr.filter(|p| p.exists()).map(|p| p.number);
    if let Some(old) = body.previous_pr {
        let old_pr = gh
            .pr_by_ref(&old.to_string())
            .await
            .with_context(|| format!("fetching previous PR {}", pr_ref(old)))?;
        if old_pr.state == PrState::Merged {
            previous = Some(old);
        }
    }
    body.previous_pr = previous;

    let mut next_prs = Vec::new();
    for next in &body.next_prs {
        let next_pr = gh
            .pr_by_ref(&next.to_string())
            .await
            .with_context(|| format!("fetching next PR {}", pr_ref(*next)))?;
        if next_pr.base_ref_name == branch {
            next_prs.push(*next);
        }
    }
    body.next_prs = next_prs;

    Ok(body.to_markdown())
}

/// Adds the PR at `url` to the next PRs of `parent_pr`, unless it is there already or the
/// parent is prignored.
async fn link_from_parent(
    ctx: &HggContext<'_>,
    gh: &mut GhClient,
    url: &str,
    parent_pr: Option<&PullRequest>,
) -> Result<()> {
    let Some(parent) = parent_pr else {
        return Ok(());
    };
    if !parent.exists() || ctx.is_pr_ignored(&parent.head_ref_name)? {
        debug!(parent = %parent.head_ref_name, "Not linking from ignored parent");
        return Ok(());
    }
    let Some(number) = pr_number_from_ref(url) else {
        return Ok(());
    };

    let mut body = PrBody::parse(&parent.body);
    if !body.add_next(number) {
        return Ok(());
    }
    gh.edit_pr(&parent.url, &["--body", &body.to_markdown()])
        .await?;
    Ok(())
}

/// Pushes `branch` to `remote`.
///
/// ## Returns
/// - `Ok(true)` - Commits were pushed.
/// - `Ok(false)` - The remote was already up to date.
fn push_branch(remote: &str, branch: &str, force: bool) -> Result<bool> {
    let mut args = vec!["push", remote, branch];
    if force {
        args.push("-f");
    }
    let output = git_output(&args)?;
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    if !output.status.success() {
        let command = command_line("git", &args);
        if is_non_fast_forward(&combined) {
            bail!(
                "`{}` was rejected. Pull the latest changes, or rerun with -f to force push.\n{}",
                command,
                combined.trim()
            );
        }
        bail!("`{}` failed: {}", command, combined.trim());
    }
    Ok(!is_up_to_date(&combined))
}

fn is_non_fast_forward(push_output: &str) -> bool {
    push_output.contains("(non-fast-forward)")
}

fn is_up_to_date(push_output: &str) -> bool {
    push_output.contains("Everything up-to-date")
}

#[cfg(test)]
mod test {
    use super::{is_non_fast_forward, is_up_to_date, SubmitStatus};

    #[test]
    fn status_after_push() {
        assert_eq!(SubmitStatus::Created.after_push(true), SubmitStatus::Created);
        assert_eq!(SubmitStatus::Skipped.after_push(true), SubmitStatus::Updated);
        assert_eq!(SubmitStatus::Updated.after_push(true), SubmitStatus::Updated);
        assert_eq!(SubmitStatus::Skipped.after_push(false), SubmitStatus::Skipped);
        assert_eq!(SubmitStatus::Created.to_string(), "created");
    }

    #[test]
    fn push_output_classification() {
        assert!(is_up_to_date("Everything up-to-date\n"));
        assert!(!is_up_to_date(
            "To github.com:acme/widgets.git\n   1111111..2222222  feature -> feature\n"
        ));
        assert!(is_non_fast_forward(
            " ! [rejected]        feature -> feature (non-fast-forward)\n"
        ));
    }
}
