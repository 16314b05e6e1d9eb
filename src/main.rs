#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use clap::Parser;
use nu_ansi_term::Color;

mod cli;
mod config;
mod constants;
mod ctx;
mod errors;
mod git;
mod github;
mod subcommands;
mod tree;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let result = match cli::Cli::parse().init_tracing_subscriber() {
        Ok(cli) => cli.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", Color::Red.bold().paint("error:"), e);
        std::process::exit(1);
    }
}
