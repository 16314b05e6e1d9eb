//! The subcommands for the `hgg` application.

use crate::ctx::HggContext;
use clap::Subcommand;
use local::{
    AddCmd, BookmarkCmd, CommitCmd, DiffCmd, PatchCmd, PullCmd, RevertCmd, StatusCmd,
    UncommitCmd,
};
use navigate::{NextCmd, PrevCmd, TopCmd, UpdateCmd};
use remote::{PrgetCmd, PrignoreCmd, PrrefreshCmd, PrsyncCmd, SubmitCmd};
use stack::{AmendCmd, CleanupCmd, EditCmd, RebaseCmd, SmartlogCmd, SquashCmd};

mod local;
mod navigate;
mod remote;
mod stack;

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    /// Print the tree of local branches, from master to every stack tip.
    #[clap(alias = "sl")]
    Smartlog(SmartlogCmd),
    /// Commit all changes to the current branch and merge them into its descendants.
    Amend(AmendCmd),
    /// Move a branch and its descendants onto another branch.
    Rebase(RebaseCmd),
    /// Delete the branches deleted on the remote and move their descendants onto master.
    Cleanup(CleanupCmd),
    /// Squash a branch into a single commit on top of its parent.
    #[clap(alias = "sq")]
    Squash(SquashCmd),
    /// Check out the child of the current branch.
    Next(NextCmd),
    /// Check out the parent of the current branch.
    Prev(PrevCmd),
    /// Check out the tip of the current stack.
    Top(TopCmd),
    /// Push the current stack and create or update its pull requests.
    Submit(SubmitCmd),
    /// Edit the description of a branch.
    #[clap(alias = "e")]
    Edit(EditCmd),
    /// Check out a pull request into a local branch.
    Prget(PrgetCmd),
    /// Overwrite the current branch's description with its pull request's.
    Prsync(PrsyncCmd),
    /// Check out the current branch's pull request and sync its description.
    Prrefresh(PrrefreshCmd),
    /// Exclude a branch from `submit`, or include it again.
    Prignore(PrignoreCmd),
    /// Stage files.
    Add(AddCmd),
    /// Commit all changes.
    Commit(CommitCmd),
    /// Show changes against a revision.
    Diff(DiffCmd),
    /// Show the changed files of the working tree or of a branch.
    #[clap(alias = "st")]
    Status(StatusCmd),
    /// Restore files from a revision.
    Revert(RevertCmd),
    /// Create or delete branches.
    #[clap(alias = "book")]
    Bookmark(BookmarkCmd),
    /// Check out a revision, snapping to a branch pointing at it.
    #[clap(alias = "up")]
    Update(UpdateCmd),
    /// Fast-forward master from the remote.
    Pull(PullCmd),
    /// Apply the changes of a commit to the working tree.
    Patch(PatchCmd),
    /// Undo the last commit of a branch, keeping its changes in the working tree.
    Uncommit(UncommitCmd),
}

impl Subcommands {
    /// Run the subcommand with the given context.
    pub async fn run(self, ctx: HggContext<'_>) -> anyhow::Result<()> {
        match self {
            Self::Smartlog(args) => args.run(ctx),
            Self::Amend(args) => args.run(ctx),
            Self::Rebase(args) => args.run(ctx),
            Self::Cleanup(args) => args.run(ctx),
            Self::Squash(args) => args.run(ctx),
            Self::Next(args) => args.run(ctx),
            Self::Prev(args) => args.run(ctx),
            Self::Top(args) => args.run(ctx),
            Self::Submit(args) => args.run(ctx).await,
            Self::Edit(args) => args.run(ctx),
            Self::Prget(args) => args.run(ctx).await,
            Self::Prsync(args) => args.run(ctx).await,
            Self::Prrefresh(args) => args.run(ctx).await,
            Self::Prignore(args) => args.run(ctx),
            Self::Add(args) => args.run(ctx),
            Self::Commit(args) => args.run(ctx),
            Self::Diff(args) => args.run(ctx),
            Self::Status(args) => args.run(ctx),
            Self::Revert(args) => args.run(ctx),
            Self::Bookmark(args) => args.run(ctx),
            Self::Update(args) => args.run(ctx),
            Self::Pull(args) => args.run(ctx),
            Self::Patch(args) => args.run(ctx),
            Self::Uncommit(args) => args.run(ctx),
        }
    }
}
