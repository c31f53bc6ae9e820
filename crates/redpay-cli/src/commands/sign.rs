//! `redpay sign` - attach a signature to a JSON payload.

use std::path::{Path, PathBuf};

use clap::Args;

use redpay_crypto::IntegrityService;

use super::KeyArg;

#[derive(Args, Debug)]
pub struct SignArgs {
    /// JSON file holding the payload.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Secret to sign with.
    #[arg(short, long, value_enum, default_value = "integrity")]
    pub mode: KeyArg,
}

pub fn run(config_path: &Path, args: &SignArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let secret = args.mode.secret(&config)?;
    let payload = super::read_json(&args.input)?;

    let signed = IntegrityService::attach_signature(&payload, secret)?;
    tracing::debug!(input = %args.input.display(), mode = ?args.mode, "payload signed");

    println!("{}", serde_json::to_string_pretty(&signed)?);
    Ok(())
}
