//! `prget` subcommand.

use crate::{
    ctx::HggContext,
    errors::ParseError,
    github::{pr_number_from_ref, GhClient},
};
use anyhow::Result;
use clap::Args;

/// CLI arguments for the `prget` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct PrgetCmd {
    /// Number or URL of the pull request to check out.
    #[clap(index = 1)]
    reference: String,
}

impl PrgetCmd {
    /// Run the `prget` subcommand.
    pub async fn run(self, _: HggContext<'_>) -> Result<()> {
        let number = self
            .reference
            .parse::<u64>()
            .ok()
            .or_else(|| pr_number_from_ref(&self.reference))
            .ok_or_else(|| ParseError::PrReference(self.reference.clone()))?;
        GhClient::new().checkout(&number.to_string()).await?;
        Ok(())
    }
}
