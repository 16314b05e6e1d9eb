//! Utilities for interacting with `git` repositories for the `hgg` application.

use crate::errors::{HgError, HgResult};
use git2::{BranchType, ErrorCode, Repository};
use run::git_lines;
use std::{collections::HashMap, env};

pub mod commit;
pub mod description;
pub mod run;
pub mod show_branch;

/// Returns the repository for the current working directory, and [None] if
/// the current working directory is not within a git repository or an error
/// occurs.
pub fn active_repository() -> Option<Repository> {
    Repository::discover(env::current_dir().ok()?).ok()
}

/// Strips the trailing `.git` and `/` from a remote URL so that `/pull/<n>` can be appended.
pub fn normalize_remote_url(url: &str) -> String {
    let url = url.trim();
    let url = url.strip_suffix(".git").unwrap_or(url);
    url.strip_suffix('/').unwrap_or(url).to_string()
}

/// Resolves every revision in `revs` to a full commit hash with a single `git rev-parse`.
pub fn resolve_revisions(revs: &[String]) -> HgResult<HashMap<String, String>> {
    if revs.is_empty() {
        return Ok(HashMap::new());
    }
    let mut args = vec!["rev-parse"];
    args.extend(revs.iter().map(String::as_str));
    let hashes = git_lines(&args)?;
    Ok(revs.iter().cloned().zip(hashes).collect())
}

/// Returns the local branches whose tip is `rev`.
pub fn branches_pointing_at(rev: &str) -> HgResult<Vec<String>> {
    git_lines(&["branch", "--points-at", rev, "--format", "%(refname:short)"])
        .map(|lines| lines.into_iter().filter(|l| !l.is_empty()).collect())
}

/// Extension trait for the [Repository] type to expose helper functions related to
/// repository management.
pub trait RepositoryExt {
    /// Returns the name of the checked out branch.
    ///
    /// ## Returns
    /// - `Ok(name)` - The short name of the branch HEAD points at.
    /// - `Err(HgError::DetachedHead)` - HEAD does not point at a local branch.
    fn current_branch_name(&self) -> HgResult<String>;

    /// Returns the name of the master branch.
    ///
    /// ## Takes
    /// - `remote` - The remote whose `HEAD` names the master branch.
    /// - `configured` - An explicit override, returned as is when set.
    fn master_branch_name(&self, remote: &str, configured: Option<&str>) -> HgResult<String>;

    /// Returns every local branch together with the full hash of its tip, sorted by name.
    fn local_branch_tips(&self) -> HgResult<Vec<(String, String)>>;

    /// Reads a string from the repository's git config.
    ///
    /// ## Returns
    /// - `Ok(Some(value))` - The key is set.
    /// - `Ok(None)` - The key is not set.
    fn config_string(&self, key: &str) -> HgResult<Option<String>>;

    /// Writes a string to the repository's local git config.
    fn set_config_string(&self, key: &str, value: &str) -> HgResult<()>;

    /// Removes a key from the repository's local git config. Removing an unset key succeeds.
    fn remove_config(&self, key: &str) -> HgResult<()>;

    /// Returns the normalized URL of `remote`, if the remote has one.
    fn remote_url(&self, remote: &str) -> HgResult<Option<String>>;

    /// Returns the comment character configured for commit message templates.
    fn comment_char(&self) -> HgResult<char>;

    /// Returns the full hash of `<remote>/<branch>`, if that remote-tracking branch exists.
    fn remote_branch_tip(&self, remote: &str, branch: &str) -> HgResult<Option<String>>;

    /// Returns the subject line of the commit at the tip of the local `branch`.
    fn branch_tip_title(&self, branch: &str) -> HgResult<String>;
}

impl RepositoryExt for Repository {
    fn current_branch_name(&self) -> HgResult<String> {
        let head = match self.head() {
            Ok(head) => head,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                // A fresh repository still names its branch through the symbolic HEAD.
                let head = self.find_reference("HEAD")?;
                return head
                    .symbolic_target()
                    .and_then(|t| t.strip_prefix("refs/heads/"))
                    .map(ToOwned::to_owned)
                    .ok_or(HgError::DetachedHead);
            }
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Err(HgError::DetachedHead);
        }
        head.shorthand()
            .map(ToOwned::to_owned)
            .ok_or(HgError::DetachedHead)
    }

    fn master_branch_name(&self, remote: &str, configured: Option<&str>) -> HgResult<String> {
        if let Some(name) = configured {
            return Ok(name.to_string());
        }

        let remote_head = format!("refs/remotes/{}/HEAD", remote);
        let target_prefix = format!("refs/remotes/{}/", remote);
        let reference = match self.find_reference(&remote_head) {
            Ok(reference) => reference,
            Err(e) if e.code() == ErrorCode::NotFound => {
                return Err(HgError::UnknownMasterBranch(remote.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        reference
            .symbolic_target()
            .and_then(|target| target.strip_prefix(target_prefix.as_str()))
            .map(ToOwned::to_owned)
            .ok_or_else(|| HgError::UnknownMasterBranch(remote.to_string()))
    }

    fn local_branch_tips(&self) -> HgResult<Vec<(String, String)>> {
        let mut tips = Vec::new();
        for branch in self.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            let (Some(name), Some(oid)) = (branch.name()?, branch.get().target()) else {
                continue;
            };
            tips.push((name.to_string(), oid.to_string()));
        }
        tips.sort();
        Ok(tips)
    }

    fn config_string(&self, key: &str) -> HgResult<Option<String>> {
        match self.config()?.snapshot()?.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_config_string(&self, key: &str, value: &str) -> HgResult<()> {
        self.config()?.set_str(key, value)?;
        Ok(())
    }

    fn remove_config(&self, key: &str) -> HgResult<()> {
        match self.config()?.remove(key) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn remote_url(&self, remote: &str) -> HgResult<Option<String>> {
        Ok(self
            .config_string(&format!("remote.{}.url", remote))?
            .map(|url| normalize_remote_url(&url)))
    }

    fn comment_char(&self) -> HgResult<char> {
        Ok(self
            .config_string("core.commentChar")?
            .filter(|c| c != "auto")
            .and_then(|c| c.chars().next())
            .filter(|c| !c.is_whitespace())
            .unwrap_or('#'))
    }

    fn remote_branch_tip(&self, remote: &str, branch: &str) -> HgResult<Option<String>> {
        match self.refname_to_id(&format!("refs/remotes/{}/{}", remote, branch)) {
            Ok(oid) => Ok(Some(oid.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn branch_tip_title(&self, branch: &str) -> HgResult<String> {
        let commit = self
            .find_branch(branch, BranchType::Local)?
            .get()
            .peel_to_commit()?;
        Ok(commit.summary().unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::normalize_remote_url;

    #[test]
    fn remote_url_suffixes_are_trimmed() {
        assert_eq!(
            normalize_remote_url("https://github.com/acme/widgets.git\n"),
            "https://github.com/acme/widgets"
        );
        assert_eq!(
            normalize_remote_url("https://github.com/acme/widgets/"),
            "https://github.com/acme/widgets"
        );
        assert_eq!(
            normalize_remote_url("https://github.com/acme/widgets"),
            "https://github.com/acme/widgets"
        );
    }
}
