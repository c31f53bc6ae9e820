use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use redpay_client::RemoteClient;
use redpay_core::{
    ApiError, AuthorizeOrder, Order, Secret, ValidateAuthorizationRequest,
    ValidateAuthorizationResponse, WebhookPreAuthorization,
};
use redpay_crypto::IntegrityService;

use crate::error::BoxError;
use crate::traits::EventSink;

pub const INTEGRITY: &str = "integrity-secret";

pub fn integrity() -> Secret {
    Secret::new(INTEGRITY)
}

/// What the scripted remote answers to one call.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok(&'static str),
    Fail(Option<&'static str>),
}

/// Remote client answering from a script; the last reply repeats forever.
pub struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Reply>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Self {
        let script: VecDeque<Reply> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(Reply::Ok("00-000"));
        Self {
            script: Mutex::new(script),
            last: Mutex::new(last),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteClient for ScriptedClient {
    async fn validate_authorization(
        &self,
        _request: &ValidateAuthorizationRequest,
    ) -> Result<ValidateAuthorizationResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| *self.last.lock().unwrap());
        match reply {
            Reply::Ok(code) => Ok(ValidateAuthorizationResponse::with_status(code)),
            Reply::Fail(Some(code)) => Err(ApiError::new("rejected").with_status_code(code)),
            Reply::Fail(None) => Err(ApiError::new("connection reset")),
        }
    }
}

/// Sink whose every callback fails.
pub struct FailingSink;

#[async_trait]
impl EventSink for FailingSink {
    async fn on_pre_authorize(
        &self,
        _webhook: &WebhookPreAuthorization,
        _order: &Order,
    ) -> Result<(), BoxError> {
        Err("pre-authorize handler crashed".into())
    }

    async fn on_info(&self, _webhook: &WebhookPreAuthorization) -> Result<(), BoxError> {
        Err("info handler crashed".into())
    }

    async fn on_success(&self, _order: &AuthorizeOrder, _status_code: &str) -> Result<(), BoxError> {
        Err("success handler crashed".into())
    }

    async fn on_error(
        &self,
        _order: &AuthorizeOrder,
        _status_code: Option<&str>,
    ) -> Result<(), BoxError> {
        Err("error handler crashed".into())
    }
}

/// Sink whose polling callbacks panic. Counts how often they were reached.
#[derive(Default)]
pub struct PanickingSink {
    calls: AtomicUsize,
}

impl PanickingSink {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSink for PanickingSink {
    async fn on_pre_authorize(
        &self,
        _webhook: &WebhookPreAuthorization,
        _order: &Order,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn on_info(&self, _webhook: &WebhookPreAuthorization) -> Result<(), BoxError> {
        Ok(())
    }

    async fn on_success(&self, order: &AuthorizeOrder, _status_code: &str) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("success handler panicked for {}", order.authorization_uuid);
    }

    async fn on_error(
        &self,
        order: &AuthorizeOrder,
        _status_code: Option<&str>,
    ) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        panic!("error handler panicked for {}", order.authorization_uuid);
    }
}

/// Webhook body signed with the integrity secret.
pub fn signed_webhook_json(token_uuid: &str, status_code: &str) -> Value {
    let body = json!({
        "token_uuid": token_uuid,
        "amount": 1500,
        "operations": { "authorization_uuid": "auth-1" },
        "status_code": status_code,
        "timestamp": "2024-05-01T10:00:00Z",
        "collector_id": "collector-1"
    });
    IntegrityService::attach_signature(&body, &integrity()).unwrap()
}

pub fn signed_webhook(token_uuid: &str, status_code: &str) -> WebhookPreAuthorization {
    serde_json::from_value(signed_webhook_json(token_uuid, status_code)).unwrap()
}
