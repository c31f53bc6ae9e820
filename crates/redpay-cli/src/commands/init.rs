//! `redpay init` - write an example configuration.

use std::path::Path;

use clap::Args;

use redpay_core::RedPayConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(config_path: &Path, args: &InitArgs) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "configuration file already exists at {}",
            config_path.display()
        );
    }

    RedPayConfig::example().save(config_path)?;
    tracing::info!(path = %config_path.display(), "wrote example config");

    println!("Wrote example configuration to {}", config_path.display());
    println!("Fill in the secrets and certificate paths, then run 'redpay check'.");
    Ok(())
}
