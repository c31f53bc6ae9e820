use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use redpay_core::{AuthorizationMode, RedPayConfig, Secret};

use crate::canonical::{base_string, SIGNATURE_FIELD};
use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signing and verification over canonicalized payloads.
///
/// Signatures are lowercase hex and are carried in the payload's own
/// `signature` field, which is excluded from the signed input.
pub struct IntegrityService;

impl IntegrityService {
    /// Signature of `payload` under `secret`.
    pub fn sign<T: Serialize + ?Sized>(payload: &T, secret: &Secret) -> Result<String, CryptoError> {
        let base = base_string(payload)?;
        Ok(hmac_sha256(secret, &base))
    }

    /// The payload as a JSON object with its `signature` field set.
    pub fn attach_signature<T: Serialize + ?Sized>(
        payload: &T,
        secret: &Secret,
    ) -> Result<Value, CryptoError> {
        let mut value = serde_json::to_value(payload)?;
        let signature = Self::sign(&value, secret)?;
        match value.as_object_mut() {
            Some(fields) => {
                fields.insert(SIGNATURE_FIELD.to_string(), Value::String(signature));
            }
            None => {
                return Err(CryptoError::UnsupportedPayload(
                    "signatures can only be attached to JSON objects".into(),
                ))
            }
        }
        Ok(value)
    }

    /// Whether the payload's `signature` field matches its content.
    ///
    /// A missing or non-string `signature` never verifies.
    pub fn verify<T: Serialize + ?Sized>(payload: &T, secret: &Secret) -> bool {
        Self::verify_or_fail(payload, secret).is_ok()
    }

    /// Like [`IntegrityService::verify`], failing with `InvalidSignature` on mismatch.
    pub fn verify_or_fail<T: Serialize + ?Sized>(
        payload: &T,
        secret: &Secret,
    ) -> Result<(), CryptoError> {
        let value = serde_json::to_value(payload)?;
        let provided = match value.get(SIGNATURE_FIELD) {
            Some(Value::String(signature)) => signature.as_str(),
            _ => {
                tracing::error!("payload carries no signature");
                return Err(CryptoError::InvalidSignature);
            }
        };

        let expected = Self::sign(&value, secret)?;
        if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
            Ok(())
        } else {
            tracing::error!("payload signature mismatch");
            Err(CryptoError::InvalidSignature)
        }
    }

    /// Signed account block sent with authorize and chargeback requests.
    ///
    /// Uses the secret of `mode`, not the integrity secret.
    pub fn sign_authorization_account(
        config: &RedPayConfig,
        mode: AuthorizationMode,
        timestamp_ms: u64,
    ) -> Result<SignedAuthorizationAccount, CryptoError> {
        let account = config
            .accounts
            .for_mode(mode)
            .ok_or(CryptoError::AccountNotConfigured(mode))?;
        let secret = config
            .secrets
            .for_mode(mode)
            .ok_or(CryptoError::SecretNotConfigured(mode))?;

        let mut signed = SignedAuthorizationAccount {
            id: account.id.clone(),
            account: AuthorizationAccount {
                number: account.number.to_string(),
                sbif_code: account.sbif_code.clone(),
                account_type: account.account_type.clone(),
            },
            timestamp: timestamp_ms,
            signature: None,
        };
        signed.signature = Some(Self::sign(&signed, secret)?);

        tracing::debug!(mode = %mode, account_id = %signed.id, "signed authorization account");
        Ok(signed)
    }
}

/// Account details as they appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationAccount {
    pub number: String,
    pub sbif_code: String,
    #[serde(rename = "type")]
    pub account_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedAuthorizationAccount {
    pub id: String,
    pub account: AuthorizationAccount,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

fn hmac_sha256(secret: &Secret, message: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.expose().as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC key can be of any size, as per crate documentation"),
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
