//! Subcommands that rewrite stacks of branches.

mod amend;
pub use amend::AmendCmd;

mod cleanup;
pub use cleanup::CleanupCmd;

mod edit;
pub use edit::EditCmd;

mod rebase;
pub use rebase::RebaseCmd;

mod smartlog;
pub use smartlog::SmartlogCmd;

mod squash;
pub use squash::SquashCmd;
