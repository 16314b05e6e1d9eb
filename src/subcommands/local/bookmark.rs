//! `bookmark` subcommand.

use crate::{ctx::HggContext, git::run::git_streamed_checked};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `bookmark` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct BookmarkCmd {
    /// Delete the named bookmarks instead of creating one.
    #[clap(short, long)]
    delete: bool,
    /// Name of the bookmark (branch) to create, or the bookmarks to delete.
    #[clap(required = true)]
    names: Vec<String>,
}

impl BookmarkCmd {
    /// Run the `bookmark` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        if self.delete {
            return ctx
                .delete_branches(&self.names)
                .with_context(|| format!("deleting {}", self.names.join(", ")));
        }

        let name = &self.names[0];
        git_streamed_checked(&["switch", "-c", name])
            .with_context(|| format!("creating branch `{}`", name))?;
        Ok(())
    }
}
