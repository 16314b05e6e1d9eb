//! The CLI for `hgg`.

use crate::{
    config::{default_cfg_path, HggConfig},
    ctx::HggContext,
    errors::HgError,
    git::active_repository,
    subcommands::Subcommands,
};
use anyhow::{anyhow, Context, Result};
use clap::{
    builder::{
        styling::{AnsiColor, Color, Style},
        Styles,
    },
    ArgAction, Parser,
};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable with `tracing` filter directives, e.g. `hgg::tree=trace`.
const LOG_ENV: &str = "HGG_LOG";

const ABOUT: &str =
    "hgg brings Mercurial's bookmark and stacked-commit workflow to git, with pull requests through `gh`.";

/// The CLI application for `hgg`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(short, action = ArgAction::Count, global = true)]
    pub v: u8,
    /// Path of the config file. Defaults to `~/.hgg.toml`.
    #[arg(long, env = "HGG_CONFIG", global = true)]
    pub config: Option<PathBuf>,
    /// The subcommand to run
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub async fn run(self) -> Result<()> {
        let config = HggConfig::load(self.config.as_deref()).with_context(|| {
            let path = self.config.clone().or_else(default_cfg_path).unwrap_or_default();
            format!("loading the config from {}", path.display())
        })?;
        let repo = active_repository().ok_or(HgError::NotARepository)?;

        self.subcommand.run(HggContext::new(&repo, config)).await
    }

    /// Installs the global subscriber, logging `hgg`'s own events to stderr.
    ///
    /// Directives in [LOG_ENV] take precedence over the `-v` count.
    pub(crate) fn init_tracing_subscriber(self) -> Result<Self> {
        let directives =
            std::env::var(LOG_ENV).unwrap_or_else(|_| verbosity_directive(self.v).to_string());
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::ERROR.into())
            .parse(directives)
            .with_context(|| format!("parsing `{}`", LOG_ENV))?;

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.v >= 3)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }
}

/// Filter directive for `-v` given `verbosity` times. Other crates stay at `error`.
fn verbosity_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "hgg=error",
        1 => "hgg=warn",
        2 => "hgg=info",
        3 => "hgg=debug",
        _ => "hgg=trace",
    }
}

/// Help colors, on the smartlog's palette: yellow headings like hashes, green literals like
/// branch names.
const fn cli_styles() -> Styles {
    let heading = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    let error = Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Red)));
    Styles::styled()
        .header(heading)
        .usage(heading)
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .placeholder(Style::new().italic())
        .valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
        .invalid(error)
        .error(error)
}

#[cfg(test)]
mod test {
    use super::{verbosity_directive, Cli};
    use clap::{CommandFactory, Parser};
    use tracing_subscriber::EnvFilter;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn mercurial_aliases() {
        let invocations: [&[&str]; 6] = [
            &["hgg", "sl"],
            &["hgg", "up", "master"],
            &["hgg", "book", "feature"],
            &["hgg", "sq"],
            &["hgg", "e"],
            &["hgg", "st"],
        ];
        for args in invocations {
            assert!(Cli::try_parse_from(args).is_ok(), "{:?} did not parse", args);
        }
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["hgg", "smartlog", "-vvv"]).unwrap();
        assert_eq!(cli.v, 3);
    }

    #[test]
    fn verbosity_directives_parse() {
        assert_eq!(verbosity_directive(0), "hgg=error");
        assert_eq!(verbosity_directive(2), "hgg=info");
        assert_eq!(verbosity_directive(4), "hgg=trace");
        assert_eq!(verbosity_directive(u8::MAX), "hgg=trace");
        for v in 0..=4 {
            assert!(EnvFilter::builder().parse(verbosity_directive(v)).is_ok());
        }
    }

    #[test]
    fn submit_flags() {
        assert!(Cli::try_parse_from(["hgg", "submit", "-n", "-f"]).is_ok());
        assert!(Cli::try_parse_from(["hgg", "amend"]).is_err());
        assert!(Cli::try_parse_from(["hgg", "amend", "-m", "fix", "-f"]).is_err());
    }
}
