//! `prsync` subcommand.

use crate::{
    ctx::HggContext,
    git::description::{set_description, BranchDescription},
    github::{pr_body::PrBody, GhClient},
};
use anyhow::{anyhow, Context, Result};
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `prsync` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrsyncCmd;

impl PrsyncCmd {
    /// Run the `prsync` subcommand.
    pub async fn run(self, ctx: HggContext<'_>) -> Result<()> {
        let branch = ctx.current_branch()?;
        sync_description(&ctx, &mut GhClient::new(), &branch).await
    }
}

/// Overwrites the description of `branch` with the title and description of its open PR.
pub(super) async fn sync_description(
    ctx: &HggContext<'_>,
    gh: &mut GhClient,
    branch: &str,
) -> Result<()> {
    let pr = gh
        .pr_for_branch(branch)
        .await?
        .ok_or_else(|| anyhow!("no PR found for branch `{}`", branch))?;

    let description = BranchDescription {
        title: pr.title,
        body: PrBody::parse(&pr.body).description,
        pr_url: Some(pr.url),
    };
    set_description(ctx.repository, branch, &description)
        .with_context(|| format!("updating the description of branch `{}`", branch))?;

    println!("{}", Color::Green.paint("Synced branch description from PR"));
    Ok(())
}
