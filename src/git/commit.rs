//! Commit metadata, parsed from the bulk `git rev-list` query.
//!
//! The query prints one record per commit with the [REV_LIST_FORMAT] layout:
//!
//! ```text
//! commit <full hash>
//! <short hash>
//! <author>
//! <relative time>
//! <epoch seconds>
//! <ref names, comma separated>
//! <title>
//! <body, any number of lines>
//! __ENDBODY__
//! ```
//!
//! [REV_LIST_FORMAT]: crate::constants::REV_LIST_FORMAT

use super::{description::BranchDescription, run::git};
use crate::{
    constants::{END_BODY_MARKER, REV_LIST_FORMAT},
    errors::{GraphError, HgResult, ParseError},
};
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches the ` (#123)` suffix GitHub adds to squash-merged commit titles.
static PR_TITLE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" \(#(\d+)\)$").unwrap());

/// Metadata of a single commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub short_hash: String,
    pub author: String,
    /// Human readable age, as rendered by `git`.
    pub relative_time: String,
    /// Committer timestamp, in seconds since the epoch.
    pub timestamp: i64,
    /// Every name decorating the commit, including remote-tracking names and tags.
    pub ref_names: Vec<String>,
    /// The decorating names that can be local branches.
    pub branch_names: Vec<String>,
    /// Whether HEAD points at this commit.
    pub is_head: bool,
    pub title: String,
    pub body: String,
    /// Whether the master branch points at this commit.
    pub is_master: bool,
    /// Set on junction nodes: commits of master's history that parent a branch.
    pub is_part_of_master: bool,
    pub description: Option<BranchDescription>,
}

impl CommitRecord {
    /// Master itself, or an anonymous commit absorbed into master's spine.
    pub fn is_effective_master(&self) -> bool {
        self.is_master || self.branch_names.is_empty()
    }

    pub fn is_ancestor_of_master(&self) -> bool {
        self.is_master || self.is_part_of_master
    }

    /// Returns the first branch name of the commit.
    ///
    /// ## Returns
    /// - `Ok(name)` - The first cleaned branch name.
    /// - `Err(GraphError::NoBranchName)` - The commit carries no branch name.
    pub fn branch_name(&self) -> Result<&str, GraphError> {
        self.branch_names
            .first()
            .map(String::as_str)
            .ok_or_else(|| GraphError::NoBranchName(self.short_hash.clone()))
    }

    /// Returns the only branch name of the commit, failing on zero or several names.
    pub fn single_branch_name(&self) -> Result<&str, GraphError> {
        match self.branch_names.as_slice() {
            [name] => Ok(name),
            [] => Err(GraphError::NoBranchName(self.short_hash.clone())),
            names => Err(GraphError::AmbiguousBranchName {
                hash: self.short_hash.clone(),
                names: names.to_vec(),
            }),
        }
    }

    /// The title to display: the description's title when one is attached, else the commit's.
    pub fn display_title(&self) -> &str {
        self.description
            .as_ref()
            .map(|d| d.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// Returns the pull request link for this commit as `(url, "#<number>")`.
    ///
    /// The PR URL stored in the branch description wins. Otherwise a ` (#123)` title suffix
    /// is combined with `remote_url`.
    pub fn pr_link(&self, remote_url: Option<&str>) -> Option<(String, String)> {
        if let Some(url) = self
            .description
            .as_ref()
            .and_then(|d| d.pr_url.as_deref())
            .filter(|u| !u.is_empty())
        {
            let number = url.rsplit('/').next().unwrap_or_default();
            return Some((url.to_string(), format!("#{}", number)));
        }

        let number = PR_TITLE_SUFFIX.captures(&self.title)?.get(1)?.as_str();
        let remote_url = remote_url?;
        Some((
            format!("{}/pull/{}", remote_url, number),
            format!("#{}", number),
        ))
    }
}

/// Result of parsing the `%D` decoration of a commit.
#[derive(Debug, Default, PartialEq, Eq)]
struct RefNames {
    names: Vec<String>,
    is_head: bool,
}

/// Splits a `%D` decoration into names, pulling out the HEAD marker.
fn parse_ref_names(decoration: &str) -> RefNames {
    let mut parsed = RefNames::default();
    for name in decoration.split(", ").map(str::trim).filter(|n| !n.is_empty()) {
        if let Some(branch) = name.strip_prefix("HEAD -> ") {
            parsed.is_head = true;
            parsed.names.push(branch.to_string());
        } else if name == "HEAD" {
            parsed.is_head = true;
        } else {
            parsed.names.push(name.to_string());
        }
    }
    parsed
}

/// Filters decoration names down to those that can be local branches.
pub fn clean_ref_names(names: &[String], remote: &str) -> Vec<String> {
    let remote_prefix = format!("{}/", remote);
    names
        .iter()
        .filter(|n| {
            !n.starts_with(&remote_prefix) && !n.starts_with("tag: ") && !n.starts_with("refs/")
        })
        .cloned()
        .collect()
}

/// Parses the output of the bulk metadata query into [CommitRecord]s.
///
/// ## Takes
/// - `output` - The raw stdout of `git rev-list --pretty=format:<REV_LIST_FORMAT>`.
/// - `master` - The name of the master branch.
/// - `remote` - The remote whose tracking names are excluded from branch names.
///
/// ## Returns
/// - `Ok(records)` - One record per commit, in output order.
/// - `Err(_)` - A record is truncated, lacks its sentinel, or has a bad timestamp.
pub fn parse_commit_records(
    output: &str,
    master: &str,
    remote: &str,
) -> Result<Vec<CommitRecord>, ParseError> {
    let mut records = Vec::new();
    let mut lines = output.lines();

    while let Some(header) = lines.next() {
        if header.trim().is_empty() {
            continue;
        }
        let hash = header
            .strip_prefix("commit ")
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ParseError::RecordHeader(header.to_string()))?
            .to_string();

        let mut fixed = [""; 6];
        for slot in fixed.iter_mut() {
            match lines.next() {
                Some(line) if line != END_BODY_MARKER => *slot = line,
                _ => return Err(ParseError::TruncatedRecord(hash)),
            }
        }
        let [short_hash, author, relative_time, timestamp, decoration, title] = fixed;

        let mut body = Vec::new();
        loop {
            match lines.next() {
                Some(END_BODY_MARKER) => break,
                Some(line) => body.push(line),
                None => return Err(ParseError::MissingEndMarker(hash)),
            }
        }

        let timestamp = timestamp
            .trim()
            .parse::<i64>()
            .map_err(|_| ParseError::Timestamp {
                hash: hash.clone(),
                timestamp: timestamp.to_string(),
            })?;
        let RefNames { names, is_head } = parse_ref_names(decoration);
        let branch_names = clean_ref_names(&names, remote);
        let is_master = branch_names.iter().any(|n| n == master);

        records.push(CommitRecord {
            hash,
            short_hash: short_hash.to_string(),
            author: author.to_string(),
            relative_time: relative_time.to_string(),
            timestamp,
            ref_names: names,
            branch_names,
            is_head,
            title: title.to_string(),
            body: body.join("\n").trim().to_string(),
            is_master,
            is_part_of_master: false,
            description: None,
        });
    }

    Ok(records)
}

/// Fetches the metadata of `hashes` with a single `git rev-list` call.
///
/// Returns an empty list without calling `git` when no hashes are given.
pub fn fetch_commit_records(
    hashes: &[&str],
    master: &str,
    remote: &str,
) -> HgResult<Vec<CommitRecord>> {
    if hashes.is_empty() {
        return Ok(Vec::new());
    }

    let pretty = format!("--pretty=format:{}", REV_LIST_FORMAT);
    let mut args = vec!["rev-list", "--no-walk=sorted", pretty.as_str()];
    args.extend_from_slice(hashes);
    let output = git(&args)?;
    Ok(parse_commit_records(&output, master, remote)?)
}
