//! Error types for the `hgg` application.

use nu_ansi_term::Color;
use thiserror::Error;

/// Malformed output from an external tool, or malformed stored content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A commit record ended before all of its fixed fields were read.
    #[error("truncated commit record starting at {:?}", .0)]
    TruncatedRecord(String),
    /// A commit record header did not have the `commit <hash>` shape.
    #[error("expected `commit <hash>` record header, found {:?}", .0)]
    RecordHeader(String),
    /// The epoch timestamp of a commit record could not be parsed.
    #[error("invalid commit timestamp {:?} for commit {}", .timestamp, .hash)]
    Timestamp { hash: String, timestamp: String },
    /// A record was not terminated by the end-of-record sentinel.
    #[error("commit record for {} is missing its end marker", .0)]
    MissingEndMarker(String),
    /// A `git show-branch` line did not match the expected layout.
    #[error("unexpected `git show-branch` line: {:?}", .0)]
    ShowBranchLine(String),
    /// `git show-branch` produced no output at all.
    #[error("`git show-branch` produced no output")]
    EmptyShowBranch,
    /// A pull request reference could not be turned into a number.
    #[error("invalid pull request reference {:?}", .0)]
    PrReference(String),
}

/// Failures of the branch graph builder and of the traversals over it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The repository has more local branches than `git show-branch` can handle.
    #[error(
        "found {} local branches but at most {} are supported. Delete some branches with `hgg bookmark -d`.",
        .count,
        .limit
    )]
    TooManyBranches { count: usize, limit: usize },
    /// A branch or reference has no resolved commit.
    #[error("no commit resolved for reference `{}`", .0)]
    UnresolvedReference(String),
    /// A commit was referenced but its metadata was not fetched.
    #[error("no commit metadata for commit {}", .0)]
    MissingCommit(String),
    /// A branch column referenced in the dump was not declared in its prelude.
    #[error("branch `{}` has no column in the `git show-branch` output", .0)]
    MissingColumn(String),
    /// Linking would create a cycle in the branch tree.
    #[error("linking commit {} under {} would create a cycle", .child, .parent)]
    Cycle { child: String, parent: String },
    /// A node that already has a parent was linked under another one.
    #[error("commit {} is already linked under {}, cannot link it under {}", .child, .existing, .parent)]
    AlreadyLinked {
        child: String,
        existing: String,
        parent: String,
    },
    /// A branch name does not map onto a node in the tree.
    #[error("branch `{}` is not part of the branch graph", Color::Blue.paint(.0))]
    UnknownBranch(String),
    /// A node carries no branch name where one is required.
    #[error("expected a branch name on commit {}", .0)]
    NoBranchName(String),
    /// A node carries several branch names where exactly one is required.
    #[error(
        "multiple branch names on commit {} ({}): there should be exactly one to push without ambiguity",
        .hash,
        .names.join(", ")
    )]
    AmbiguousBranchName { hash: String, names: Vec<String> },
    /// The node has no parent branch to move to.
    #[error("no parent found for `{}`", .0)]
    NoParent(String),
    /// The node has no child branch to move to.
    #[error("no child found for `{}`", .0)]
    NoChild(String),
    /// The node has more than one child, so the move is ambiguous.
    #[error("ambiguous command: `{}` has more than one child", .0)]
    MultipleChildren(String),
}

/// Top-level error for the library parts of `hgg`.
#[derive(Error, Debug)]
pub enum HgError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// An external command exited unsuccessfully.
    #[error("`{}` failed: {}", .command, .stderr.trim())]
    CommandFailed { command: String, stderr: String },
    /// The working copy is not inside a git repository.
    #[error("not in a git repository")]
    NotARepository,
    /// The master branch could not be determined.
    #[error(
        "could not determine the master branch from `refs/remotes/{}/HEAD`. Run `git remote set-head {} --auto` or set `master-branch` in the config.",
        .0,
        .0
    )]
    UnknownMasterBranch(String),
    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,
    /// The user aborted an interactive step.
    #[error("interrupted")]
    Interrupted,
    #[error("libgit2 error: {}", .0)]
    Git2(#[from] git2::Error),
    #[error("io error: {}", .0)]
    Io(#[from] std::io::Error),
    #[error("invalid JSON from `gh`: {}", .0)]
    Json(#[from] serde_json::Error),
    #[error("invalid config file: {}", .0)]
    Config(#[from] toml::de::Error),
    #[error("inquire error: {}", .0)]
    Inquire(#[from] inquire::InquireError),
}

pub type HgResult<T> = Result<T, HgError>;
