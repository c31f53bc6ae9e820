use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use redpay_core::{AuthorizeOrder, Order, WebhookPreAuthorization};

use crate::error::BoxError;
use crate::traits::EventSink;

/// One callback observed by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    PreAuthorize { token_uuid: String, amount: i64 },
    Info { token_uuid: String, status_code: String },
    Success { authorization_uuid: String, status_code: String },
    Error { authorization_uuid: String, status_code: Option<String> },
}

/// Event sink that keeps every callback in memory, in arrival order.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn on_pre_authorize(
        &self,
        webhook: &WebhookPreAuthorization,
        order: &Order,
    ) -> Result<(), BoxError> {
        self.record(SinkEvent::PreAuthorize {
            token_uuid: order.token_uuid.clone(),
            amount: webhook.amount,
        });
        Ok(())
    }

    async fn on_info(&self, webhook: &WebhookPreAuthorization) -> Result<(), BoxError> {
        self.record(SinkEvent::Info {
            token_uuid: webhook.token_uuid.clone(),
            status_code: webhook.status_code.clone(),
        });
        Ok(())
    }

    async fn on_success(&self, order: &AuthorizeOrder, status_code: &str) -> Result<(), BoxError> {
        self.record(SinkEvent::Success {
            authorization_uuid: order.authorization_uuid.clone(),
            status_code: status_code.to_string(),
        });
        Ok(())
    }

    async fn on_error(
        &self,
        order: &AuthorizeOrder,
        status_code: Option<&str>,
    ) -> Result<(), BoxError> {
        self.record(SinkEvent::Error {
            authorization_uuid: order.authorization_uuid.clone(),
            status_code: status_code.map(str::to_string),
        });
        Ok(())
    }
}
