//! `diff` subcommand.

use crate::{ctx::HggContext, git::run::git_streamed_checked};
use anyhow::{Context, Result};
use clap::Args;

/// CLI arguments for the `diff` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct DiffCmd {
    /// Revision to diff against. `.^` is the commit of the parent branch.
    #[clap(short, long)]
    rev: Option<String>,
    /// Limit the diff to these paths.
    paths: Vec<String>,
}

impl DiffCmd {
    /// Run the `diff` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let range = match &self.rev {
            Some(rev) => Some(format!(
                "{}..HEAD",
                ctx.resolve_rev(rev)
                    .with_context(|| format!("resolving `{}`", rev))?
            )),
            None => None,
        };

        let mut args = vec!["-c", "color.ui=always", "diff"];
        args.extend(range.as_deref());
        args.extend(self.paths.iter().map(String::as_str));
        git_streamed_checked(&args).context("running git diff")?;
        Ok(())
    }
}
