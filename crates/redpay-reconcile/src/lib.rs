//! RedPay authorization reconciliation
//!
//! Drives pending authorizations to a final outcome from two directions:
//! signed pre-authorization webhooks pushed by the network, and a polling
//! loop that re-checks pending authorizations until none remain.

pub mod error;
pub mod traits;
pub mod retry;
pub mod webhook;
pub mod poller;
pub mod engine;
pub mod adapters;

pub use adapters::{InMemoryOrders, RecordingSink, SinkEvent};
pub use engine::ReconciliationEngine;
pub use error::{BoxError, ReconcileError};
pub use poller::{AuthorizationPoller, TickOutcome, TickReport};
pub use retry::RetryPolicy;
pub use traits::{AuthorizeOrderSource, EventSink, OrderStore};
pub use webhook::WebhookProcessor;

#[cfg(test)]
mod test_support;
