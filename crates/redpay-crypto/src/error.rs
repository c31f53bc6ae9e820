use redpay_core::AuthorizationMode;

/// Errors raised while canonicalizing, signing or verifying payloads.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("unsupported payload: {0}")]
    UnsupportedPayload(String),

    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("no account configured for mode '{0}'")]
    AccountNotConfigured(AuthorizationMode),

    #[error("no secret configured for mode '{0}'")]
    SecretNotConfigured(AuthorizationMode),
}
