//! RedPay CLI - operator tools for a RedPay client configuration.
//!
//! Subcommands: init, check, sign, verify.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use redpay_core::{LoggingConfig, RedPayConfig};

/// RedPay - sign and verify payment network messages.
#[derive(Parser, Debug)]
#[command(name = "redpay", version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, global = true, default_value = "redpay.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an example configuration file.
    Init(commands::init::InitArgs),
    /// Load and validate the configuration.
    Check(commands::check::CheckArgs),
    /// Attach a signature to a JSON payload.
    Sign(commands::sign::SignArgs),
    /// Verify the signature carried by a JSON payload.
    Verify(commands::verify::VerifyArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A broken config is reported by the subcommand itself.
    let logging = RedPayConfig::load(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging, cli.log_level.as_deref());

    match &cli.command {
        Commands::Init(args) => commands::init::run(&cli.config, args),
        Commands::Check(args) => commands::check::run(&cli.config, args),
        Commands::Sign(args) => commands::sign::run(&cli.config, args),
        Commands::Verify(args) => commands::verify::run(&cli.config, args),
    }
}

/// `RUST_LOG` wins, then `--log-level`, then the config file.
fn init_tracing(logging: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(&logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
