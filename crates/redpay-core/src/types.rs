use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::status;

fn default_reusability() -> u32 {
    1
}

/// A payment token grant previously issued by the collector.
///
/// Owned by the embedding application's order store; the reconciliation
/// engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identifier of the payment token.
    pub token_uuid: String,
    /// Identifier of the user that owns the token.
    pub user_id: String,
    /// Amount in the smallest currency unit.
    pub amount: i64,
    /// How many times the token may be authorized.
    #[serde(default = "default_reusability")]
    pub reusability: u32,
    /// Set once the token has been revoked. Revoked orders are terminal.
    #[serde(default, alias = "revoket_at", skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn new(token_uuid: impl Into<String>, user_id: impl Into<String>, amount: i64) -> Self {
        Self {
            token_uuid: token_uuid.into(),
            user_id: user_id.into(),
            amount,
            reusability: default_reusability(),
            revoked_at: None,
        }
    }

    pub fn with_reusability(mut self, reusability: u32) -> Self {
        self.reusability = reusability;
        self
    }

    pub fn with_revoked_at(mut self, revoked_at: DateTime<Utc>) -> Self {
        self.revoked_at = Some(revoked_at);
        self
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// A pending authorization awaiting reconciliation against the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeOrder {
    pub authorization_uuid: String,
    pub token_uuid: String,
    pub user_id: String,
    #[serde(default)]
    pub is_confirmed: bool,
    /// Last status code seen for this authorization, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
}

impl AuthorizeOrder {
    pub fn new(
        authorization_uuid: impl Into<String>,
        token_uuid: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            authorization_uuid: authorization_uuid.into(),
            token_uuid: token_uuid.into(),
            user_id: user_id.into(),
            is_confirmed: false,
            status_code: None,
        }
    }

    /// Build the collector-side validation request for this authorization.
    pub fn validation_request(&self) -> ValidateAuthorizationRequest {
        ValidateAuthorizationRequest::collector(&self.user_id, &self.authorization_uuid)
    }
}

/// Role of the enrolled user issuing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Collector,
    Payer,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collector => write!(f, "collector"),
            Self::Payer => write!(f, "payer"),
        }
    }
}

/// Body of the `authorization/check` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateAuthorizationRequest {
    #[serde(rename = "enroller_user_id")]
    pub user_id: String,
    pub authorization_uuid: String,
    pub user_type: UserType,
    /// Only sent by payers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_uuid: Option<String>,
}

impl ValidateAuthorizationRequest {
    pub fn collector(user_id: impl Into<String>, authorization_uuid: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            authorization_uuid: authorization_uuid.into(),
            user_type: UserType::Collector,
            validation_uuid: None,
        }
    }

    pub fn payer(
        user_id: impl Into<String>,
        authorization_uuid: impl Into<String>,
        validation_uuid: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            authorization_uuid: authorization_uuid.into(),
            user_type: UserType::Payer,
            validation_uuid: Some(validation_uuid.into()),
        }
    }
}

/// Response of the `authorization/check` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateAuthorizationResponse {
    pub status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Fields this client does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ValidateAuthorizationResponse {
    pub fn with_status(status_code: impl Into<String>) -> Self {
        Self {
            status_code: status_code.into(),
            amount: None,
            payer_id: None,
            extra_data: None,
            operation_uuid: None,
            signature: None,
            extra: Map::new(),
        }
    }
}

/// Operation identifiers carried by a pre-authorization webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookOperations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_uuid: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Inbound pre-authorization event, signed by the RedPay network.
///
/// Unknown fields are preserved in `extra` so that the signature is checked
/// against exactly the fields the counterparty signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPreAuthorization {
    pub token_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_med: Option<bool>,
    pub amount: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<WebhookOperations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collector_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WebhookPreAuthorization {
    /// Whether the event reports a successful pre-authorization.
    pub fn is_ok(&self) -> bool {
        status::is_ok(&self.status_code)
    }
}
