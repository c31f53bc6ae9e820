//! `redpay check` - load, validate and summarize the configuration.

use std::path::Path;

use clap::Args;

use redpay_core::AuthorizationMode;

#[derive(Args, Debug)]
pub struct CheckArgs {}

pub fn run(config_path: &Path, _args: &CheckArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    println!("Configuration OK: {}", config_path.display());
    println!("  Environment: {}", config.environment);
    println!("  Role:        {}", config.enroller);
    println!("  Base URL:    {}", config.base_url());
    println!(
        "  Certificate: {} (verify server: {})",
        config.certificate.cert_path.display(),
        config.certificate.verify_ssl
    );

    for mode in AuthorizationMode::ALL {
        let secret = config.secrets.for_mode(mode).is_some();
        let account = config.accounts.for_mode(mode).is_some();
        println!("  {mode:<21} secret: {secret:<5} account: {account}");
    }

    let reconcile = &config.reconcile;
    let cap = reconcile
        .retry_cap()
        .map_or_else(|| "unbounded".to_string(), |cap| cap.to_string());
    println!(
        "  Polling:     every {} ms, retry {:?} after {} ms (max {})",
        reconcile.poll_interval_ms, reconcile.retry_status_codes, reconcile.retry_delay_ms, cap
    );

    tracing::debug!(path = %config_path.display(), "configuration validated");
    Ok(())
}
