//! Integration test: signatures computed the way the counterparty does.
//!
//! Typed DTOs from redpay-core and raw JSON bodies must canonicalize to the
//! same base string, so a signature made on one verifies on the other.

use serde_json::{json, Value};

use redpay_core::{
    AuthorizationMode, RedPayConfig, Secret, ValidateAuthorizationRequest, WebhookPreAuthorization,
};
use redpay_crypto::{base_string, CryptoError, IntegrityService, SIGNATURE_FIELD};

fn secret() -> Secret {
    Secret::new("shared-secret")
}

#[test]
fn test_typed_and_raw_payloads_share_signatures() {
    let request = ValidateAuthorizationRequest::collector("collector-1", "auth-1");
    let raw = json!({
        "user_type": "collector",
        "authorization_uuid": "auth-1",
        "enroller_user_id": "collector-1",
    });

    assert_eq!(base_string(&request).unwrap(), base_string(&raw).unwrap());
    assert_eq!(
        IntegrityService::sign(&request, &secret()).unwrap(),
        IntegrityService::sign(&raw, &secret()).unwrap()
    );
}

#[test]
fn test_received_webhook_round_trips_through_dto() {
    // Field order as sent over the wire, including fields the DTO does not name.
    let raw: Value = serde_json::from_str(
        r#"{
            "timestamp": "2024-05-01T10:00:00Z",
            "status_code": "00-000",
            "amount": 2990,
            "token_uuid": "tok-1",
            "is_med": false,
            "operations": {"authorization_uuid": "auth-1", "generation_uuid": "gen-1"},
            "data": {"b": 2, "a": [1, "x"]},
            "channel": "app",
            "message": null
        }"#,
    )
    .unwrap();
    let signed = IntegrityService::attach_signature(&raw, &secret()).unwrap();

    let webhook: WebhookPreAuthorization = serde_json::from_value(signed.clone()).unwrap();
    assert!(webhook.is_ok());
    assert_eq!(webhook.signature.as_deref(), signed[SIGNATURE_FIELD].as_str());

    IntegrityService::verify_or_fail(&webhook, &secret()).unwrap();
    IntegrityService::verify_or_fail(&signed, &secret()).unwrap();
    assert!(!IntegrityService::verify(&webhook, &Secret::new("other")));
}

#[test]
fn test_signature_survives_reserialization_but_not_edits() {
    let signed =
        IntegrityService::attach_signature(&json!({"amount": 10, "token_uuid": "t"}), &secret())
            .unwrap();
    let reparsed: Value = serde_json::from_str(&signed.to_string()).unwrap();
    assert!(IntegrityService::verify(&reparsed, &secret()));

    let mut edited = reparsed;
    edited["token_uuid"] = json!("u");
    assert!(matches!(
        IntegrityService::verify_or_fail(&edited, &secret()),
        Err(CryptoError::InvalidSignature)
    ));
}

#[test]
fn test_signed_authorization_account_from_config() {
    let config = RedPayConfig::example();
    let signed = IntegrityService::sign_authorization_account(
        &config,
        AuthorizationMode::Authorize,
        1_714_557_600_000,
    )
    .unwrap();

    assert_eq!(signed.account.number, "12345678");
    let secret = config
        .secrets
        .for_mode(AuthorizationMode::Authorize)
        .unwrap();
    IntegrityService::verify_or_fail(&signed, secret).unwrap();

    let err = IntegrityService::sign_authorization_account(
        &config,
        AuthorizationMode::Chargeback,
        1_714_557_600_000,
    )
    .unwrap_err();
    assert!(matches!(
        err,
        CryptoError::AccountNotConfigured(AuthorizationMode::Chargeback)
    ));
}
