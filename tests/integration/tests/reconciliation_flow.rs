//! Integration test: reconciliation across crates.
//!
//! Webhooks signed with redpay-crypto, remote calls through the
//! redpay-client service façade, and the redpay-reconcile engine driving
//! the in-memory reference store until no authorization is left pending.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use redpay_client::{ClientError, Endpoint, HttpMethod, RedPayService, Role, Transport};
use redpay_core::{
    ApiError, AuthorizationState, AuthorizeOrder, Order, RedPayConfig, WebhookPreAuthorization,
};
use redpay_crypto::IntegrityService;
use redpay_reconcile::{
    BoxError, EventSink, InMemoryOrders, ReconcileError, ReconciliationEngine, RecordingSink,
    SinkEvent,
};

const CONFIG: &str = r#"
type = "collector"
environment = "integration"

[secrets]
integrity = "integrity-secret"

[certificate]
cert_path = "certs/client.crt"
key_path = "certs/client.key"

[reconcile]
poll_interval_ms = 1000
retry_delay_ms = 2000
max_retry_attempts = 5
"#;

fn config() -> RedPayConfig {
    RedPayConfig::from_toml_str(CONFIG).expect("test config should be valid")
}

/// Remote answering `authorization/check` from a per-authorization script.
/// Authorizations without a script are approved.
#[derive(Default)]
struct FakeRemote {
    scripts: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    fn script(&self, authorization_uuid: &str, replies: Vec<Result<Value, ApiError>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(authorization_uuid.to_string(), replies.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeRemote {
    async fn send(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        payload: Value,
    ) -> Result<Value, ClientError> {
        assert_eq!(method, HttpMethod::Post);
        assert_eq!(endpoint, Endpoint::ValidateAuthorization);
        assert_eq!(payload["user_type"], "collector");

        let id = payload["authorization_uuid"].as_str().unwrap().to_string();
        self.calls.lock().unwrap().push(id.clone());
        let reply = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&id)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Ok(body)) => Ok(body),
            Some(Err(err)) => Err(ClientError::Api(err)),
            None => Ok(json!({ "status_code": "00-000", "amount": 1500 })),
        }
    }
}

/// Embedder callbacks that update the store the way an application would.
struct StoreSink {
    orders: Arc<InMemoryOrders>,
    recorded: RecordingSink,
}

#[async_trait]
impl EventSink for StoreSink {
    async fn on_pre_authorize(
        &self,
        webhook: &WebhookPreAuthorization,
        order: &Order,
    ) -> Result<(), BoxError> {
        self.orders.record_authorization(&order.token_uuid);
        self.recorded.on_pre_authorize(webhook, order).await
    }

    async fn on_info(&self, webhook: &WebhookPreAuthorization) -> Result<(), BoxError> {
        self.recorded.on_info(webhook).await
    }

    async fn on_success(&self, order: &AuthorizeOrder, status_code: &str) -> Result<(), BoxError> {
        self.orders
            .confirm(&order.authorization_uuid, status_code)
            .ok_or("confirmed an unknown authorization")?;
        self.recorded.on_success(order, status_code).await
    }

    async fn on_error(
        &self,
        order: &AuthorizeOrder,
        status_code: Option<&str>,
    ) -> Result<(), BoxError> {
        self.orders.remove(&order.authorization_uuid);
        self.recorded.on_error(order, status_code).await
    }
}

struct Harness {
    orders: Arc<InMemoryOrders>,
    remote: Arc<FakeRemote>,
    sink: Arc<StoreSink>,
    engine: ReconciliationEngine,
}

fn harness() -> Harness {
    let config = config();
    let orders = Arc::new(InMemoryOrders::new());
    let remote = Arc::new(FakeRemote::default());
    let sink = Arc::new(StoreSink {
        orders: Arc::clone(&orders),
        recorded: RecordingSink::new(),
    });
    let service = RedPayService::new(Role::Collector, remote.clone());
    let engine = ReconciliationEngine::new(
        &config,
        orders.clone(),
        orders.clone(),
        Arc::new(service),
        sink.clone(),
    )
    .unwrap();
    Harness {
        orders,
        remote,
        sink,
        engine,
    }
}

fn webhook(token_uuid: &str, status_code: &str) -> Value {
    let body = json!({
        "token_uuid": token_uuid,
        "amount": 1500,
        "operations": { "authorization_uuid": format!("auth-{token_uuid}") },
        "status_code": status_code,
        "timestamp": "2024-05-01T10:00:00Z",
        "collector_id": "collector-1",
    });
    IntegrityService::attach_signature(&body, &config().secrets.integrity).unwrap()
}

// =========================================================================
// Polling path
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_polling_resolves_every_order_then_stops() {
    let h = harness();
    for id in ["auth-1", "auth-2", "auth-3"] {
        h.orders.enqueue(AuthorizeOrder::new(id, "tok-1", "collector-1"));
    }
    h.remote.script(
        "auth-2",
        vec![Err(ApiError::new("authorization pending").with_status_code("07-006"))],
    );
    h.remote.script(
        "auth-3",
        vec![Err(ApiError::new("authorization rejected").with_status_code("03-001"))],
    );

    assert!(h.engine.start());
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!h.engine.is_running(), "an empty queue stops polling");
    assert_eq!(h.orders.pending_count(), 0);
    assert_eq!(h.remote.calls(), vec!["auth-1", "auth-2", "auth-2", "auth-3"]);
    assert_eq!(
        h.sink.recorded.events(),
        vec![
            SinkEvent::Success {
                authorization_uuid: "auth-1".into(),
                status_code: "00-000".into()
            },
            SinkEvent::Success {
                authorization_uuid: "auth-2".into(),
                status_code: "00-000".into()
            },
            SinkEvent::Error {
                authorization_uuid: "auth-3".into(),
                status_code: Some("03-001".into())
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_polling_restarts_for_new_orders() {
    let h = harness();
    assert!(h.engine.start());
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!h.engine.is_running());

    h.orders.enqueue(AuthorizeOrder::new("auth-9", "tok-9", "collector-1"));
    assert!(h.engine.start());
    tokio::time::sleep(Duration::from_secs(3)).await;

    assert!(!h.engine.is_running());
    assert!(h.orders.authorize_order("auth-9").unwrap().is_confirmed);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_success_body_is_terminal() {
    let h = harness();
    h.orders.enqueue(AuthorizeOrder::new("auth-1", "tok-1", "collector-1"));
    h.remote.script("auth-1", vec![Ok(json!({ "amount": 1500 }))]);

    h.engine.run_once().await.unwrap();
    assert_eq!(h.remote.calls().len(), 1);
    assert_eq!(
        h.sink.recorded.events(),
        vec![SinkEvent::Error {
            authorization_uuid: "auth-1".into(),
            status_code: None
        }]
    );
}

// =========================================================================
// Webhook path
// =========================================================================

#[tokio::test]
async fn test_webhooks_enforce_reuse_limit() {
    let h = harness();
    h.orders
        .insert_order(Order::new("tok-1", "payer-1", 1500).with_reusability(2));

    for _ in 0..2 {
        let state = h
            .engine
            .process_pre_authorization_json(&webhook("tok-1", "00-000"))
            .await
            .unwrap();
        assert_eq!(state, AuthorizationState::Confirmed);
    }

    let err = h
        .engine
        .process_pre_authorization_json(&webhook("tok-1", "00-000"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::OrderReuseLimitExceeded {
            reusability: 2,
            count: 2,
            ..
        }
    ));
    assert_eq!(h.sink.recorded.events().len(), 2);
}

#[tokio::test]
async fn test_webhook_for_revoked_order_is_rejected() {
    let h = harness();
    h.orders.insert_order(Order::new("tok-1", "payer-1", 1500));
    h.orders.revoke("tok-1", chrono::Utc::now()).unwrap();

    let err = h
        .engine
        .process_pre_authorization_json(&webhook("tok-1", "00-000"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::OrderRevoked { .. }));
    assert!(h.sink.recorded.events().is_empty());
}

#[tokio::test]
async fn test_non_ok_webhook_is_informational() {
    let h = harness();
    h.orders.insert_order(Order::new("tok-1", "payer-1", 1500));

    let state = h
        .engine
        .process_pre_authorization_json(&webhook("tok-1", "02-004"))
        .await
        .unwrap();
    assert_eq!(state, AuthorizationState::Pending);
    assert_eq!(
        h.sink.recorded.events(),
        vec![SinkEvent::Info {
            token_uuid: "tok-1".into(),
            status_code: "02-004".into()
        }]
    );
}

#[tokio::test]
async fn test_tampered_webhook_is_rejected() {
    let h = harness();
    h.orders.insert_order(Order::new("tok-1", "payer-1", 1500));

    let mut body = webhook("tok-1", "00-000");
    body["amount"] = json!(150_000);

    let err = h
        .engine
        .process_pre_authorization_json(&body)
        .await
        .unwrap_err();
    assert!(matches!(err, ReconcileError::InvalidSignature));
    assert!(h.sink.recorded.events().is_empty());
}
