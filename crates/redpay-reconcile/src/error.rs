use chrono::{DateTime, Utc};

use redpay_core::{ApiError, CoreError};
use redpay_crypto::CryptoError;

/// Error type returned by embedder callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reconciliation errors.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("webhook signature is invalid")]
    InvalidSignature,

    #[error("malformed webhook payload: {0}")]
    MalformedWebhook(#[from] serde_json::Error),

    #[error("order {token_uuid} was revoked at {revoked_at}")]
    OrderRevoked {
        token_uuid: String,
        revoked_at: DateTime<Utc>,
    },

    #[error("order {token_uuid} reached its reuse limit ({count} of {reusability})")]
    OrderReuseLimitExceeded {
        token_uuid: String,
        reusability: u32,
        count: u32,
    },

    #[error("order not found: {0}")]
    OrderNotFound(String),

    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("order store error: {0}")]
    Store(String),

    #[error("remote API error: {0}")]
    Api(#[from] ApiError),

    /// A callback supplied by the embedding application failed.
    #[error("event handler failed: {0}")]
    Implementation(#[source] BoxError),

    #[error(transparent)]
    Crypto(CryptoError),

    #[error(transparent)]
    State(#[from] CoreError),
}

impl From<CryptoError> for ReconcileError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::InvalidSignature => Self::InvalidSignature,
            other => Self::Crypto(other),
        }
    }
}
