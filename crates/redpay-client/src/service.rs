use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use redpay_core::status::STATUS_CODE_USER_NOT_FOUND;
use redpay_core::{
    ApiError, Enroller, RedPayConfig, ValidateAuthorizationRequest, ValidateAuthorizationResponse,
};

use crate::endpoints::{Endpoint, HttpMethod};
use crate::error::ClientError;
use crate::http::SignedHttpClient;
use crate::traits::{RemoteClient, Transport};

/// Capability set of the enrolled client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Issues payment tokens and chargebacks.
    Collector,
    /// Authorizes payment tokens.
    Payer,
    /// Both.
    Dual,
}

impl Role {
    pub fn can_collect(&self) -> bool {
        matches!(self, Self::Collector | Self::Dual)
    }

    pub fn can_pay(&self) -> bool {
        matches!(self, Self::Payer | Self::Dual)
    }
}

impl From<Enroller> for Role {
    fn from(enroller: Enroller) -> Self {
        match enroller {
            Enroller::Collector => Self::Collector,
            Enroller::Payer => Self::Payer,
            Enroller::Dual => Self::Dual,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Payer => write!(f, "payer"),
            Self::Dual => write!(f, "dual"),
        }
    }
}

/// Entry point for RedPay API calls, restricted to what the enrolled role may do.
///
/// Operations outside the role fail with [`ClientError::UnsupportedOperation`]
/// before any request is sent.
pub struct RedPayService {
    role: Role,
    transport: Arc<dyn Transport>,
}

impl RedPayService {
    pub fn new(role: Role, transport: Arc<dyn Transport>) -> Self {
        Self { role, transport }
    }

    /// Build the service over the signed mTLS transport.
    pub fn from_config(config: &RedPayConfig) -> Result<Self, ClientError> {
        let transport = SignedHttpClient::from_config(config)?;
        tracing::info!(
            role = %config.enroller,
            base_url = config.base_url(),
            "RedPay service ready"
        );
        Ok(Self::new(config.enroller.into(), Arc::new(transport)))
    }

    pub fn role(&self) -> Role {
        self.role
    }

    fn require(&self, operation: &'static str, allowed: bool) -> Result<(), ClientError> {
        if allowed {
            Ok(())
        } else {
            Err(ClientError::UnsupportedOperation {
                operation,
                role: self.role,
            })
        }
    }

    async fn call<B: Serialize + ?Sized + Sync>(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        body: &B,
    ) -> Result<Value, ClientError> {
        let payload = serde_json::to_value(body)?;
        self.transport.send(method, endpoint, payload).await
    }

    // Collector operations

    pub async fn generate_token<B: Serialize + ?Sized + Sync>(
        &self,
        token: &B,
    ) -> Result<Value, ClientError> {
        self.require("generate_token", self.role.can_collect())?;
        self.call(HttpMethod::Post, Endpoint::GenerateToken, token).await
    }

    pub async fn revoke_token<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
    ) -> Result<Value, ClientError> {
        self.require("revoke_token", self.role.can_collect())?;
        self.call(HttpMethod::Post, Endpoint::RevokeToken, request).await
    }

    pub async fn generate_chargeback<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
    ) -> Result<Value, ClientError> {
        self.require("generate_chargeback", self.role.can_collect())?;
        self.call(HttpMethod::Post, Endpoint::Chargeback, request).await
    }

    // Payer operations

    pub async fn authorize_token<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
    ) -> Result<Value, ClientError> {
        self.require("authorize_token", self.role.can_pay())?;
        self.call(HttpMethod::Post, Endpoint::AuthorizeToken, request).await
    }

    // Shared operations

    pub async fn validate_token<B: Serialize + ?Sized + Sync>(
        &self,
        request: &B,
    ) -> Result<Value, ClientError> {
        self.call(HttpMethod::Post, Endpoint::ValidateToken, request).await
    }

    pub async fn validate_authorization(
        &self,
        request: &ValidateAuthorizationRequest,
    ) -> Result<ValidateAuthorizationResponse, ClientError> {
        let value = self
            .call(HttpMethod::Post, Endpoint::ValidateAuthorization, request)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create_user<B: Serialize + ?Sized + Sync>(
        &self,
        user: &B,
    ) -> Result<Value, ClientError> {
        self.call(HttpMethod::Post, Endpoint::User, user).await
    }

    pub async fn update_user<B: Serialize + ?Sized + Sync>(
        &self,
        user: &B,
    ) -> Result<Value, ClientError> {
        self.call(HttpMethod::Put, Endpoint::User, user).await
    }

    pub async fn get_user<B: Serialize + ?Sized + Sync>(
        &self,
        query: &B,
    ) -> Result<Value, ClientError> {
        self.call(HttpMethod::Get, Endpoint::User, query).await
    }

    /// Like [`RedPayService::get_user`], failing with `UserNotFound` on an empty answer.
    pub async fn get_user_or_fail<B: Serialize + ?Sized + Sync>(
        &self,
        query: &B,
    ) -> Result<Value, ClientError> {
        let user = self.get_user(query).await?;
        let empty = user.as_object().map_or(true, |fields| fields.is_empty());
        let not_found = user.get("status_code").and_then(Value::as_str)
            == Some(STATUS_CODE_USER_NOT_FOUND);
        if empty || not_found {
            return Err(ClientError::UserNotFound);
        }
        Ok(user)
    }

    pub async fn verify_user_enrollment<B: Serialize + ?Sized + Sync>(
        &self,
        query: &B,
    ) -> Result<Value, ClientError> {
        self.call(HttpMethod::Get, Endpoint::UserVerify, query).await
    }
}

#[async_trait]
impl RemoteClient for RedPayService {
    async fn validate_authorization(
        &self,
        request: &ValidateAuthorizationRequest,
    ) -> Result<ValidateAuthorizationResponse, ApiError> {
        RedPayService::validate_authorization(self, request)
            .await
            .map_err(ClientError::into_api_error)
    }
}
