pub mod check;
pub mod init;
pub mod sign;
pub mod verify;

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde_json::Value;

use redpay_core::{AuthorizationMode, RedPayConfig, Secret};

/// Which configured secret signs or verifies a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyArg {
    /// Secret for requests and webhooks.
    Integrity,
    Authorize,
    Chargeback,
    #[value(name = "chargeback_automatic")]
    ChargebackAutomatic,
}

impl KeyArg {
    pub fn secret<'a>(&self, config: &'a RedPayConfig) -> anyhow::Result<&'a Secret> {
        let mode = match self {
            Self::Integrity => return Ok(&config.secrets.integrity),
            Self::Authorize => AuthorizationMode::Authorize,
            Self::Chargeback => AuthorizationMode::Chargeback,
            Self::ChargebackAutomatic => AuthorizationMode::ChargebackAutomatic,
        };
        config
            .secrets
            .for_mode(mode)
            .with_context(|| format!("no secret configured for {mode}"))
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<RedPayConfig> {
    RedPayConfig::load(path).with_context(|| format!("failed to load {}", path.display()))
}

pub fn read_json(path: &Path) -> anyhow::Result<Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}
