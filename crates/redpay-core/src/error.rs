use crate::config::AuthorizationMode;
use crate::state_machine::AuthorizationState;

/// Core domain errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid authorization transition from {from} to {to}")]
    InvalidStateTransition {
        from: AuthorizationState,
        to: AuthorizationState,
    },
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("account '{0}' is configured but its secret is missing")]
    MissingSecret(AuthorizationMode),

    #[error("configuration is already set and cannot be modified")]
    AlreadyConfigured,
}
