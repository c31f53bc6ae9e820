//! Client configuration loading, validation and set-once storage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::error::ConfigError;
use crate::secret::Secret;
use crate::status::STATUS_CODE_RETRY;

pub const API_URL_PRODUCTION: &str = "https://api.redpay.cl";
pub const API_URL_INTEGRATION: &str = "https://test.api.redpay.junngla.com";

/// Full configuration of a RedPay client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedPayConfig {
    /// Target RedPay environment.
    pub environment: Environment,

    /// Role this client is enrolled as.
    #[serde(rename = "type")]
    pub enroller: Enroller,

    /// Shared HMAC secrets.
    pub secrets: Secrets,

    /// mTLS client certificate.
    pub certificate: CertificateConfig,

    /// Bank accounts used per authorization mode.
    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Reconciliation engine tuning.
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Purpose a secret or account is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    Authorize,
    Chargeback,
    ChargebackAutomatic,
}

impl AuthorizationMode {
    pub const ALL: [AuthorizationMode; 3] = [
        AuthorizationMode::Authorize,
        AuthorizationMode::Chargeback,
        AuthorizationMode::ChargebackAutomatic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorize => "authorize",
            Self::Chargeback => "chargeback",
            Self::ChargebackAutomatic => "chargeback_automatic",
        }
    }
}

impl fmt::Display for AuthorizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthorizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown authorization mode: {}", s))
    }
}

/// One integrity secret for all webhook/response validation plus one per authorization mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secrets {
    pub integrity: Secret,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chargeback: Option<Secret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chargeback_automatic: Option<Secret>,
}

impl Secrets {
    pub fn new(integrity: impl Into<Secret>) -> Self {
        Self {
            integrity: integrity.into(),
            authorize: None,
            chargeback: None,
            chargeback_automatic: None,
        }
    }

    pub fn with_mode(mut self, mode: AuthorizationMode, secret: impl Into<Secret>) -> Self {
        let secret = Some(secret.into());
        match mode {
            AuthorizationMode::Authorize => self.authorize = secret,
            AuthorizationMode::Chargeback => self.chargeback = secret,
            AuthorizationMode::ChargebackAutomatic => self.chargeback_automatic = secret,
        }
        self
    }

    /// Secret for `mode`, ignoring blank values.
    pub fn for_mode(&self, mode: AuthorizationMode) -> Option<&Secret> {
        let secret = match mode {
            AuthorizationMode::Authorize => self.authorize.as_ref(),
            AuthorizationMode::Chargeback => self.chargeback.as_ref(),
            AuthorizationMode::ChargebackAutomatic => self.chargeback_automatic.as_ref(),
        };
        secret.filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Integration,
}

impl Environment {
    pub fn base_url(&self) -> &'static str {
        match self {
            Self::Production => API_URL_PRODUCTION,
            Self::Integration => API_URL_INTEGRATION,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Integration => write!(f, "integration"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// PEM encoded client certificate.
    pub cert_path: PathBuf,
    /// PEM encoded PKCS#8 private key.
    pub key_path: PathBuf,
    /// Verify the server certificate.
    #[serde(default = "default_true", alias = "verify_SLL")]
    pub verify_ssl: bool,
}

/// Role the client is enrolled as on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enroller {
    Collector,
    Payer,
    Dual,
}

impl fmt::Display for Enroller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Payer => write!(f, "payer"),
            Self::Dual => write!(f, "dual"),
        }
    }
}

/// A bank account registered with the enroller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub number: u64,
    pub sbif_code: String,
    #[serde(rename = "type")]
    pub account_type: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize: Option<AccountConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chargeback: Option<AccountConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chargeback_automatic: Option<AccountConfig>,
}

impl AccountsConfig {
    pub fn for_mode(&self, mode: AuthorizationMode) -> Option<&AccountConfig> {
        match mode {
            AuthorizationMode::Authorize => self.authorize.as_ref(),
            AuthorizationMode::Chargeback => self.chargeback.as_ref(),
            AuthorizationMode::ChargebackAutomatic => self.chargeback_automatic.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Interval between polling ticks (milliseconds).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Fixed delay before retrying an order the remote asked to retry (milliseconds).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Maximum retry attempts per order and tick. `0` means unbounded.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,
    /// Remote status codes that trigger a retry.
    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: Vec<String>,
}

impl ReconcileConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn retry_cap(&self) -> Option<u32> {
        (self.max_retry_attempts > 0).then_some(self.max_retry_attempts)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_true() -> bool {
    true
}
fn default_poll_interval_ms() -> u64 {
    1_000
}
fn default_retry_delay_ms() -> u64 {
    2_000
}
fn default_max_retry_attempts() -> u32 {
    30
}
fn default_retry_status_codes() -> Vec<String> {
    vec![STATUS_CODE_RETRY.to_string()]
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_status_codes: default_retry_status_codes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl RedPayConfig {
    /// Build a configuration with defaults for every optional section.
    pub fn new(
        secrets: Secrets,
        environment: Environment,
        certificate: CertificateConfig,
        enroller: Enroller,
    ) -> Self {
        Self {
            secrets,
            environment,
            certificate,
            enroller,
            accounts: AccountsConfig::default(),
            reconcile: ReconcileConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: RedPayConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the current config to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject configurations that would only fail later, at first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secrets.integrity.is_empty() {
            return Err(ConfigError::Invalid {
                field: "secrets.integrity",
                reason: "must not be empty".into(),
            });
        }
        if self.certificate.cert_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "certificate.cert_path",
                reason: "must not be empty".into(),
            });
        }
        if self.certificate.key_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "certificate.key_path",
                reason: "must not be empty".into(),
            });
        }
        for mode in AuthorizationMode::ALL {
            if self.accounts.for_mode(mode).is_some() && self.secrets.for_mode(mode).is_none() {
                return Err(ConfigError::MissingSecret(mode));
            }
        }
        if self.reconcile.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "reconcile.poll_interval_ms",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    pub fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }

    /// Example configuration written by `redpay init`.
    pub fn example() -> Self {
        let mut config = Self::new(
            Secrets::new("change-me-integrity")
                .with_mode(AuthorizationMode::Authorize, "change-me-authorize"),
            Environment::Integration,
            CertificateConfig {
                cert_path: PathBuf::from("certs/certificate.crt"),
                key_path: PathBuf::from("certs/private.key"),
                verify_ssl: true,
            },
            Enroller::Collector,
        );
        config.accounts.authorize = Some(AccountConfig {
            id: "account-1".into(),
            number: 12345678,
            sbif_code: "001".into(),
            account_type: "checking".into(),
        });
        config
    }
}

/// Holds a validated configuration that can be set exactly once.
///
/// Owned by the embedding application; a second `set` is rejected rather
/// than silently replacing the configuration other components already hold.
#[derive(Debug, Default)]
pub struct ConfigSlot {
    inner: OnceLock<Arc<RedPayConfig>>,
}

impl ConfigSlot {
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    pub fn set(&self, config: RedPayConfig) -> Result<Arc<RedPayConfig>, ConfigError> {
        config.validate()?;
        let config = Arc::new(config);
        self.inner
            .set(Arc::clone(&config))
            .map_err(|_| ConfigError::AlreadyConfigured)?;
        tracing::info!(
            environment = %config.environment,
            role = %config.enroller,
            "configuration installed"
        );
        Ok(config)
    }

    pub fn get(&self) -> Option<Arc<RedPayConfig>> {
        self.inner.get().cloned()
    }
}
