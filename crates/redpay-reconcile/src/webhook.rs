use std::sync::Arc;

use serde_json::Value;

use redpay_core::{
    AuthorizationEvent, AuthorizationState, AuthorizationStateMachine, Order, Secret,
    WebhookPreAuthorization,
};
use redpay_crypto::IntegrityService;

use crate::error::ReconcileError;
use crate::traits::{EventSink, OrderStore};

/// Validates pre-authorization webhooks and reports them to the embedder.
///
/// Holds no mutable state; safe to call concurrently from many requests.
pub struct WebhookProcessor {
    integrity: Secret,
    store: Arc<dyn OrderStore>,
    sink: Arc<dyn EventSink>,
}

impl WebhookProcessor {
    pub fn new(integrity: Secret, store: Arc<dyn OrderStore>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            integrity,
            store,
            sink,
        }
    }

    /// Process a decoded webhook.
    ///
    /// Returns the state the authorization reached. Revoked orders and
    /// exhausted tokens are reported as errors, not through the sink.
    pub async fn process(
        &self,
        webhook: &WebhookPreAuthorization,
    ) -> Result<AuthorizationState, ReconcileError> {
        if let Err(err) = IntegrityService::verify_or_fail(webhook, &self.integrity) {
            tracing::error!(token_uuid = %webhook.token_uuid, "rejecting webhook: invalid signature");
            return Err(err.into());
        }
        self.dispatch(webhook).await
    }

    /// Process a raw webhook body.
    ///
    /// The signature is checked against the body exactly as received, before decoding.
    pub async fn process_json(&self, body: &Value) -> Result<AuthorizationState, ReconcileError> {
        if let Err(err) = IntegrityService::verify_or_fail(body, &self.integrity) {
            let token_uuid = body.get("token_uuid").and_then(Value::as_str).unwrap_or("-");
            tracing::error!(token_uuid, "rejecting webhook: invalid signature");
            return Err(err.into());
        }
        let webhook: WebhookPreAuthorization = serde_json::from_value(body.clone())?;
        self.dispatch(&webhook).await
    }

    async fn dispatch(
        &self,
        webhook: &WebhookPreAuthorization,
    ) -> Result<AuthorizationState, ReconcileError> {
        let order = self.store.get_order(&webhook.token_uuid).await?;
        let state = AuthorizationState::Pending;

        if !webhook.is_ok() {
            let state =
                AuthorizationStateMachine::transition(state, AuthorizationEvent::Informational)?;
            tracing::info!(
                token_uuid = %webhook.token_uuid,
                status_code = %webhook.status_code,
                "informational webhook"
            );
            self.sink
                .on_info(webhook)
                .await
                .map_err(ReconcileError::Implementation)?;
            return Ok(state);
        }

        self.check_order(&order).await?;

        let state = AuthorizationStateMachine::transition(state, AuthorizationEvent::PreAuthorized)?;
        tracing::info!(
            token_uuid = %order.token_uuid,
            amount = webhook.amount,
            "pre-authorization accepted"
        );
        self.sink
            .on_pre_authorize(webhook, &order)
            .await
            .map_err(ReconcileError::Implementation)?;
        Ok(state)
    }

    /// Revocation first, then the reuse limit.
    async fn check_order(&self, order: &Order) -> Result<(), ReconcileError> {
        if let Some(revoked_at) = order.revoked_at {
            AuthorizationStateMachine::transition(
                AuthorizationState::Pending,
                AuthorizationEvent::OrderRevoked,
            )?;
            tracing::error!(token_uuid = %order.token_uuid, revoked_at = %revoked_at, "order is revoked");
            return Err(ReconcileError::OrderRevoked {
                token_uuid: order.token_uuid.clone(),
                revoked_at,
            });
        }

        let Some(count) = self.store.count_authorizations(&order.token_uuid).await? else {
            return Ok(());
        };
        if count >= order.reusability {
            AuthorizationStateMachine::transition(
                AuthorizationState::Pending,
                AuthorizationEvent::ReuseLimitReached,
            )?;
            tracing::error!(
                token_uuid = %order.token_uuid,
                reusability = order.reusability,
                count,
                "order reuse limit exceeded"
            );
            return Err(ReconcileError::OrderReuseLimitExceeded {
                token_uuid: order.token_uuid.clone(),
                reusability: order.reusability,
                count,
            });
        }
        Ok(())
    }
}
