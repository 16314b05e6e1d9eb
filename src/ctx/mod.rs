//! The in-memory context of the `hgg` application.

use crate::{
    config::HggConfig,
    constants::{PARENT_REV, PRUNED_LINE_PREFIX},
    errors::{GraphError, HgResult},
    git::{
        branches_pointing_at,
        commit::fetch_commit_records,
        description::all_descriptions,
        resolve_revisions,
        run::{git_streamed_checked, git_tee},
        show_branch::show_branches,
        RepositoryExt,
    },
    tree::{
        builder::{build_repo_data, junction_candidates, plan_graph, GraphInput},
        RepoData,
    },
};
use git2::Repository;
use tracing::info;

mod patch;
mod restack;

/// Where a revision resolves to when checking it out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevResolution {
    /// A local branch points at the revision.
    Branch(String),
    /// No branch points at the revision. Holds the revision as given.
    Detached(String),
}

impl RevResolution {
    /// Picks the branch to snap to among the `branches` pointing at `rev`.
    ///
    /// `rev` itself wins when it is one of several branches; otherwise the first one does.
    pub fn pick(rev: &str, branches: &[String], exclude: Option<&str>) -> Self {
        let candidates = branches
            .iter()
            .filter(|b| Some(b.as_str()) != exclude)
            .collect::<Vec<_>>();
        match candidates.as_slice() {
            [] => Self::Detached(rev.to_string()),
            [only] => Self::Branch(only.to_string()),
            [first, ..] if !candidates.iter().any(|b| b.as_str() == rev) => {
                Self::Branch(first.to_string())
            }
            _ => Self::Branch(rev.to_string()),
        }
    }
}

/// The in-memory context of the `hgg` application.
pub struct HggContext<'a> {
    /// The repository the command runs in.
    pub repository: &'a Repository,
    /// The user configuration.
    pub config: HggConfig,
}

impl<'a> HggContext<'a> {
    pub fn new(repository: &'a Repository, config: HggConfig) -> Self {
        Self { repository, config }
    }

    /// Returns the master branch name, from the config or the remote's `HEAD`.
    pub fn master_branch(&self) -> HgResult<String> {
        self.repository
            .master_branch_name(&self.config.remote, self.config.master_branch.as_deref())
    }

    pub fn current_branch(&self) -> HgResult<String> {
        self.repository.current_branch_name()
    }

    /// Normalized URL of the configured remote, if it has one.
    pub fn remote_url(&self) -> HgResult<Option<String>> {
        self.repository.remote_url(&self.config.remote)
    }

    /// Builds the branch graph of the repository.
    ///
    /// Runs `git show-branch` over every local branch, resolves the junction candidates of the
    /// dump in one `git rev-parse`, plans the edges, then fetches the metadata of the planned
    /// commits in one `git rev-list` and attaches the stored branch descriptions.
    pub fn load_repo_data(&self) -> HgResult<RepoData> {
        let master = self.master_branch()?;
        let tips = self.repository.local_branch_tips()?;
        let names = tips.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>();

        let dump = show_branches(&names)?;
        let resolved = resolve_revisions(&junction_candidates(&dump, &master))?;
        let plan = plan_graph(&GraphInput {
            master: &master,
            branch_tips: &tips,
            dump: &dump,
            resolved: &resolved,
        })?;

        let records = fetch_commit_records(&plan.required_hashes(), &master, &self.config.remote)?;
        let mut repo = build_repo_data(&plan, records)?;
        repo.attach_descriptions(all_descriptions(self.repository)?);

        info!(
            branches = tips.len(),
            edges = plan.edges().len(),
            nodes = repo.len(),
            junctions = resolved.len(),
            "Built branch graph"
        );
        Ok(repo)
    }

    /// Resolves `.^` to the commit of the current branch's parent branch. Any other revision
    /// is returned as is.
    pub fn resolve_rev(&self, rev: &str) -> HgResult<String> {
        if rev != PARENT_REV {
            return Ok(rev.to_string());
        }

        let repo = self.load_repo_data()?;
        let current = self.current_branch()?;
        let node = repo.require_branch(&current)?;
        let parent = repo
            .parent(node)
            .and_then(|p| repo.commit(p))
            .ok_or_else(|| GraphError::NoParent(current.clone()))?;
        Ok(parent.hash.clone())
    }

    /// Resolves `rev` to the branch pointing at it, if any, ignoring `exclude`.
    pub fn resolve_branch_name(&self, rev: &str, exclude: Option<&str>) -> HgResult<RevResolution> {
        let branches = branches_pointing_at(rev)?;
        Ok(RevResolution::pick(rev, &branches, exclude))
    }

    /// Resolves `rev` and requires a branch to point at it.
    pub fn require_branch_name(&self, rev: &str) -> HgResult<String> {
        match self.resolve_branch_name(rev, None)? {
            RevResolution::Branch(name) => Ok(name),
            RevResolution::Detached(rev) => Err(GraphError::NoBranchName(rev).into()),
        }
    }

    /// Checks out `rev`, snapping to a branch pointing at it when there is one, and detaching
    /// HEAD otherwise.
    pub fn update_rev(&self, rev: &str, exclude: Option<&str>) -> HgResult<()> {
        match self.resolve_branch_name(rev, exclude)? {
            RevResolution::Branch(name) => self.switch(&name),
            RevResolution::Detached(rev) => git_streamed_checked(&["switch", "--detach", &rev]),
        }
    }

    pub fn switch(&self, branch: &str) -> HgResult<()> {
        git_streamed_checked(&["switch", branch])
    }

    /// Force-deletes `branches`, first moving off the current branch if it is one of them.
    pub fn delete_branches(&self, branches: &[String]) -> HgResult<()> {
        let current = self.current_branch()?;
        if branches.contains(&current) {
            self.update_rev(&current, Some(current.as_str()))?;
        }

        let mut args = vec!["branch", "-D"];
        args.extend(branches.iter().map(String::as_str));
        git_streamed_checked(&args)
    }

    /// Stages everything and commits it with `message`.
    pub fn commit_all(&self, message: &str) -> HgResult<()> {
        git_streamed_checked(&["add", "--all"])?;
        git_streamed_checked(&["commit", "-m", message])
    }

    /// Fast-forwards the local master branch from the remote, even when it is checked out.
    pub fn pull(&self) -> HgResult<()> {
        let master = self.master_branch()?;
        let refspec = format!("{0}:{0}", master);
        git_streamed_checked(&[
            "-c",
            "color.ui=always",
            "fetch",
            &self.config.remote,
            &refspec,
            "--update-head-ok",
        ])
    }

    /// Prunes remote-tracking branches deleted on the remote, returning their branch names.
    pub fn prune_remote(&self) -> HgResult<Vec<String>> {
        let out = git_tee(&["remote", "prune", &self.config.remote])?;
        Ok(pruned_branches(&out, &self.config.remote))
    }

    /// Whether `branch` is excluded from `submit`.
    pub fn is_pr_ignored(&self, branch: &str) -> HgResult<bool> {
        Ok(self
            .repository
            .config_string(&pr_ignore_key(branch))?
            .is_some_and(|v| v == "true"))
    }

    /// Sets or clears the prignore flag of `branch`.
    pub fn set_pr_ignored(&self, branch: &str, ignored: bool) -> HgResult<()> {
        let key = pr_ignore_key(branch);
        if ignored {
            self.repository.set_config_string(&key, "true")
        } else {
            self.repository.remove_config(&key)
        }
    }
}

fn pr_ignore_key(branch: &str) -> String {
    format!("branch.{}.hggit.prignore", branch)
}

/// Extracts the branch names from the output of `git remote prune <remote>`.
fn pruned_branches(output: &str, remote: &str) -> Vec<String> {
    let prefix = format!("{}{}/", PRUNED_LINE_PREFIX, remote);
    output
        .lines()
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod test {
    use super::{pr_ignore_key, pruned_branches, RevResolution};

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn rev_resolution() {
        assert_eq!(
            RevResolution::pick("abc123", &[], None),
            RevResolution::Detached("abc123".into())
        );
        assert_eq!(
            RevResolution::pick("abc123", &names(&["feature"]), None),
            RevResolution::Branch("feature".into())
        );
        assert_eq!(
            RevResolution::pick("abc123", &names(&["a", "b"]), None),
            RevResolution::Branch("a".into())
        );
        assert_eq!(
            RevResolution::pick("b", &names(&["a", "b"]), None),
            RevResolution::Branch("b".into())
        );
    }

    #[test]
    fn rev_resolution_excludes_branch() {
        assert_eq!(
            RevResolution::pick("feature", &names(&["feature"]), Some("feature")),
            RevResolution::Detached("feature".into())
        );
        assert_eq!(
            RevResolution::pick("feature", &names(&["feature", "copy"]), Some("feature")),
            RevResolution::Branch("copy".into())
        );
    }

    #[test]
    fn parses_pruned_branches() {
        let out = "Pruning origin\nURL: git@github.com:acme/widgets.git\n * [pruned] origin/feature-a\n * [pruned] origin/team/feature-b\n * [pruned] upstream/other\n";
        assert_eq!(
            pruned_branches(out, "origin"),
            vec!["feature-a".to_string(), "team/feature-b".to_string()]
        );
        assert!(pruned_branches("", "origin").is_empty());
    }

    #[test]
    fn prignore_key() {
        assert_eq!(pr_ignore_key("feature"), "branch.feature.hggit.prignore");
    }
}
