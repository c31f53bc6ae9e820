use async_trait::async_trait;
use serde_json::Value;

use redpay_core::{ApiError, ValidateAuthorizationRequest, ValidateAuthorizationResponse};

use crate::endpoints::{Endpoint, HttpMethod};
use crate::error::ClientError;

/// Sends signed requests to the RedPay API.
///
/// `payload` is the unsigned JSON body (or query parameters for `GET`);
/// implementations attach the signature and verify signed responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        payload: Value,
    ) -> Result<Value, ClientError>;
}

/// The remote call the reconciliation engine depends on.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn validate_authorization(
        &self,
        request: &ValidateAuthorizationRequest,
    ) -> Result<ValidateAuthorizationResponse, ApiError>;
}
