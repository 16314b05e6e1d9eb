//! Subcommands wrapping everyday `git` operations.

mod add;
pub use add::AddCmd;

mod bookmark;
pub use bookmark::BookmarkCmd;

mod commit;
pub use commit::CommitCmd;

mod diff;
pub use diff::DiffCmd;

mod patch;
pub use patch::PatchCmd;

mod pull;
pub use pull::PullCmd;

mod revert;
pub use revert::RevertCmd;

mod status;
pub use status::StatusCmd;

mod uncommit;
pub use uncommit::UncommitCmd;
