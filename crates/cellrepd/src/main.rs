//! cellrepd — cell rep daemon tooling.
//!
//! Loads a cell's `rep.toml` and answers the questions an operator asks
//! before putting the cell into the auction.
//!
//! # Usage
//!
//! ```text
//! cellrepd check-config --config /var/vcap/jobs/rep/config/rep.toml
//! cellrepd resolve-rootfs --config rep.toml preloaded:cflinuxfs4
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "cellrepd", about = "Cell rep daemon", version)]
struct Cli {
    /// Log output format.
    #[arg(long, value_enum, default_value = "text", global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the config and print what the cell will advertise.
    CheckConfig {
        /// Path to rep.toml.
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the concrete path a rootfs reference resolves to.
    ResolveRootfs {
        /// Path to rep.toml.
        #[arg(long)]
        config: PathBuf,

        /// Rootfs reference, e.g. `preloaded:cflinuxfs4`.
        reference: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Command::CheckConfig { config } | Command::ResolveRootfs { config, .. } => config,
    };
    let config = commands::load_config(config_path)?;

    init_tracing(cli.log_format, &config.log_level);

    match &cli.command {
        Command::CheckConfig { .. } => commands::check_config::check_config(&config),
        Command::ResolveRootfs { reference, .. } => {
            commands::resolve_rootfs::resolve_rootfs(&config, reference)
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured level applies.
fn init_tracing(format: LogFormat, log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
