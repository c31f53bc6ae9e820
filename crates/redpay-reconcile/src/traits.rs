use async_trait::async_trait;

use redpay_core::{AuthorizeOrder, Order, WebhookPreAuthorization};

use crate::error::{BoxError, ReconcileError};

/// Read access to the embedder's payment orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fails with [`ReconcileError::OrderNotFound`] for unknown tokens.
    async fn get_order(&self, token_uuid: &str) -> Result<Order, ReconcileError>;

    /// Successful authorizations recorded against a token.
    ///
    /// `None` means the store does not track them and the reuse check is skipped.
    async fn count_authorizations(&self, _token_uuid: &str) -> Result<Option<u32>, ReconcileError> {
        Ok(None)
    }
}

/// Source of authorizations still awaiting a final answer.
#[async_trait]
pub trait AuthorizeOrderSource: Send + Sync {
    async fn pending_orders(&self) -> Result<Vec<AuthorizeOrder>, ReconcileError>;
}

/// Callbacks through which outcomes are reported to the embedder.
///
/// Each outcome is reported exactly once per webhook call or polling pass.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_pre_authorize(
        &self,
        webhook: &WebhookPreAuthorization,
        order: &Order,
    ) -> Result<(), BoxError>;

    async fn on_info(&self, webhook: &WebhookPreAuthorization) -> Result<(), BoxError>;

    async fn on_success(&self, order: &AuthorizeOrder, status_code: &str) -> Result<(), BoxError>;

    /// `status_code` is `None` when the call failed without a remote answer.
    async fn on_error(
        &self,
        order: &AuthorizeOrder,
        status_code: Option<&str>,
    ) -> Result<(), BoxError>;
}
