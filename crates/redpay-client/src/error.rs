use std::path::PathBuf;

use redpay_core::ApiError;
use redpay_crypto::CryptoError;

use crate::service::Role;

/// Errors raised by the RedPay transport and service facade.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Non-2xx response from the RedPay API.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("response signature is invalid")]
    InvalidSignature,

    #[error("operation '{operation}' is not available for role '{role}'")]
    UnsupportedOperation { operation: &'static str, role: Role },

    #[error("failed to read certificate material '{}': {source}", .path.display())]
    Certificate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("user not found")]
    UserNotFound,
}

impl ClientError {
    /// Collapse into an [`ApiError`], keeping the remote status code when there is one.
    ///
    /// Local failures carry no status code and are therefore never retried.
    pub fn into_api_error(self) -> ApiError {
        match self {
            Self::Api(err) => err,
            other => ApiError::new(other.to_string()),
        }
    }
}
