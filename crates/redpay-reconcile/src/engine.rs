use std::sync::Arc;

use serde_json::Value;

use redpay_client::RemoteClient;
use redpay_core::{AuthorizationState, RedPayConfig, WebhookPreAuthorization};

use crate::error::ReconcileError;
use crate::poller::{AuthorizationPoller, TickOutcome};
use crate::retry::RetryPolicy;
use crate::traits::{AuthorizeOrderSource, EventSink, OrderStore};
use crate::webhook::WebhookProcessor;

/// Both reconciliation paths wired to the same embedder callbacks.
pub struct ReconciliationEngine {
    webhooks: WebhookProcessor,
    poller: AuthorizationPoller,
}

impl ReconciliationEngine {
    pub fn new(
        config: &RedPayConfig,
        store: Arc<dyn OrderStore>,
        pending: Arc<dyn AuthorizeOrderSource>,
        client: Arc<dyn RemoteClient>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ReconcileError> {
        let webhooks =
            WebhookProcessor::new(config.secrets.integrity.clone(), store, Arc::clone(&sink));
        let poller = AuthorizationPoller::new(
            pending,
            client,
            sink,
            RetryPolicy::from(&config.reconcile),
            config.reconcile.poll_interval(),
        )?;
        Ok(Self { webhooks, poller })
    }

    pub async fn process_pre_authorization(
        &self,
        webhook: &WebhookPreAuthorization,
    ) -> Result<AuthorizationState, ReconcileError> {
        self.webhooks.process(webhook).await
    }

    /// Process a webhook straight from its raw JSON body.
    pub async fn process_pre_authorization_json(
        &self,
        body: &Value,
    ) -> Result<AuthorizationState, ReconcileError> {
        self.webhooks.process_json(body).await
    }

    pub fn start(&self) -> bool {
        self.poller.start()
    }

    pub fn stop(&self) -> bool {
        self.poller.stop()
    }

    pub fn is_running(&self) -> bool {
        self.poller.is_running()
    }

    pub async fn run_once(&self) -> Result<TickOutcome, ReconcileError> {
        self.poller.run_once().await
    }

    pub fn webhooks(&self) -> &WebhookProcessor {
        &self.webhooks
    }

    pub fn poller(&self) -> &AuthorizationPoller {
        &self.poller
    }
}
