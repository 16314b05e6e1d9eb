//! `smartlog` subcommand.

use crate::{ctx::HggContext, tree::fmt::SmartlogOptions};
use anyhow::{Context, Result};
use clap::Args;
use std::{
    io::IsTerminal,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

/// CLI arguments for the `smartlog` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct SmartlogCmd {
    /// Print the time taken to build and render the graph.
    #[clap(short, long)]
    time: bool,
}

impl SmartlogCmd {
    /// Run the `smartlog` subcommand.
    pub fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let start = Instant::now();
        let repo = ctx.load_repo_data().context("building the branch graph")?;

        // A detached HEAD still renders, with no branch in bold.
        let current = ctx.current_branch().ok();
        let remote_url = ctx.remote_url()?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let opts = SmartlogOptions {
            current_branch: current.as_deref(),
            now,
            remote_url: remote_url.as_deref(),
            color: std::io::stdout().is_terminal(),
        };
        let mut out = String::new();
        repo.write_smartlog(&mut out, &opts)?;
        print!("{}", out);

        if self.time {
            println!("Finished in {:.2} s.", start.elapsed().as_secs_f64());
        }
        Ok(())
    }
}
