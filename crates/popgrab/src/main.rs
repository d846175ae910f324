//! popgrab - incremental POP3 attachment harvester.
//!
//! Polls configured mailbox accounts, fetches messages not seen on earlier
//! runs, and writes their attachments under per-sender directories.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use popgrab_core::{Config, Pop3Connector, Poller};

#[derive(Debug, Parser)]
#[command(name = "popgrab", version, about = "Incremental POP3 attachment harvester")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Write a template configuration file to the config path and exit.
    #[arg(long)]
    generate: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if cli.generate {
        fs::write(&cli.config, popgrab_core::config::TEMPLATE)
            .with_context(|| format!("cannot write {}", cli.config.display()))?;
        info!(path = %cli.config.display(), "wrote template configuration");
        return Ok(());
    }

    let config = Config::load(&cli.config)
        .with_context(|| format!("cannot load {}", cli.config.display()))?;

    info!(
        accounts = config.accounts.len(),
        continuous = config.continuous,
        "starting popgrab"
    );

    Poller::new(config, Pop3Connector).run().await;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "popgrab=debug,popgrab_core=debug,popgrab_pop3=debug,popgrab_mime=debug"
    } else {
        "popgrab=info,popgrab_core=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["popgrab"]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert!(!cli.generate);
        assert!(!cli.debug);
    }

    #[test]
    fn cli_flags() {
        let cli = Cli::parse_from(["popgrab", "-c", "/tmp/other.yaml", "--generate", "--debug"]);
        assert_eq!(cli.config, PathBuf::from("/tmp/other.yaml"));
        assert!(cli.generate);
        assert!(cli.debug);
    }
}
