//! `redpay verify` - check the signature carried by a JSON payload.

use std::path::{Path, PathBuf};

use clap::Args;

use redpay_crypto::IntegrityService;

use super::KeyArg;

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// JSON file holding the signed payload.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Secret the payload was signed with.
    #[arg(short, long, value_enum, default_value = "integrity")]
    pub mode: KeyArg,
}

pub fn run(config_path: &Path, args: &VerifyArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let secret = args.mode.secret(&config)?;
    let payload = super::read_json(&args.input)?;

    if let Err(err) = IntegrityService::verify_or_fail(&payload, secret) {
        tracing::error!(input = %args.input.display(), error = %err, "signature check failed");
        anyhow::bail!("signature mismatch in {}", args.input.display());
    }

    println!("Signature valid: {}", args.input.display());
    Ok(())
}
