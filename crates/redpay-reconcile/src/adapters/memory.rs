use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use redpay_core::{AuthorizeOrder, Order};

use crate::error::ReconcileError;
use crate::traits::{AuthorizeOrderSource, OrderStore};

/// Pending authorization plus its enqueue position.
#[derive(Debug, Clone)]
struct PendingEntry {
    seq: u64,
    order: AuthorizeOrder,
}

/// In-memory order store and pending-authorization queue.
///
/// Orders are keyed by token, pending authorizations by authorization id and
/// returned in the order they were enqueued. Intended for tests, demos and
/// single-process embedders.
pub struct InMemoryOrders {
    /// Payment orders keyed by token_uuid.
    orders: DashMap<String, Order>,
    /// Successful authorizations per token_uuid.
    authorizations: DashMap<String, u32>,
    /// Authorizations awaiting reconciliation, keyed by authorization_uuid.
    pending: DashMap<String, PendingEntry>,
    next_seq: AtomicU64,
    track_reuse: bool,
}

impl InMemoryOrders {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            authorizations: DashMap::new(),
            pending: DashMap::new(),
            next_seq: AtomicU64::new(0),
            track_reuse: true,
        }
    }

    /// A store that reports authorization counts as untracked, skipping reuse checks.
    pub fn without_reuse_tracking() -> Self {
        Self {
            track_reuse: false,
            ..Self::new()
        }
    }

    pub fn insert_order(&self, order: Order) {
        tracing::debug!(token_uuid = %order.token_uuid, "order stored");
        self.orders.insert(order.token_uuid.clone(), order);
    }

    pub fn order(&self, token_uuid: &str) -> Option<Order> {
        self.orders.get(token_uuid).map(|o| o.value().clone())
    }

    /// Mark an order revoked. Revocation is permanent.
    pub fn revoke(&self, token_uuid: &str, at: DateTime<Utc>) -> Result<(), ReconcileError> {
        let mut order = self
            .orders
            .get_mut(token_uuid)
            .ok_or_else(|| ReconcileError::OrderNotFound(token_uuid.to_string()))?;
        if order.revoked_at.is_none() {
            order.revoked_at = Some(at);
            tracing::info!(token_uuid, revoked_at = %at, "order revoked");
        }
        Ok(())
    }

    /// Count one more successful authorization against a token.
    pub fn record_authorization(&self, token_uuid: &str) -> u32 {
        let mut count = self.authorizations.entry(token_uuid.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Queue an authorization for reconciliation. Re-enqueueing keeps its position.
    pub fn enqueue(&self, order: AuthorizeOrder) {
        match self.pending.entry(order.authorization_uuid.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().order = order,
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                entry.insert(PendingEntry { seq, order });
            }
        }
    }

    /// Mark an authorization confirmed so it is no longer returned as pending.
    pub fn confirm(&self, authorization_uuid: &str, status_code: &str) -> Option<AuthorizeOrder> {
        let mut entry = self.pending.get_mut(authorization_uuid)?;
        entry.order.is_confirmed = true;
        entry.order.status_code = Some(status_code.to_string());
        Some(entry.order.clone())
    }

    pub fn remove(&self, authorization_uuid: &str) -> Option<AuthorizeOrder> {
        self.pending
            .remove(authorization_uuid)
            .map(|(_, entry)| entry.order)
    }

    pub fn authorize_order(&self, authorization_uuid: &str) -> Option<AuthorizeOrder> {
        self.pending
            .get(authorization_uuid)
            .map(|entry| entry.order.clone())
    }

    pub fn pending_count(&self) -> usize {
        self.pending
            .iter()
            .filter(|entry| !entry.order.is_confirmed)
            .count()
    }
}

impl Default for InMemoryOrders {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrders {
    async fn get_order(&self, token_uuid: &str) -> Result<Order, ReconcileError> {
        self.order(token_uuid)
            .ok_or_else(|| ReconcileError::OrderNotFound(token_uuid.to_string()))
    }

    async fn count_authorizations(&self, token_uuid: &str) -> Result<Option<u32>, ReconcileError> {
        if !self.track_reuse {
            return Ok(None);
        }
        Ok(Some(
            self.authorizations.get(token_uuid).map(|c| *c).unwrap_or(0),
        ))
    }
}

#[async_trait]
impl AuthorizeOrderSource for InMemoryOrders {
    async fn pending_orders(&self) -> Result<Vec<AuthorizeOrder>, ReconcileError> {
        let mut entries: Vec<PendingEntry> = self
            .pending
            .iter()
            .filter(|entry| !entry.order.is_confirmed)
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        Ok(entries.into_iter().map(|entry| entry.order).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_order() {
        let store = InMemoryOrders::new();
        let result = store.get_order("nope").await;
        assert!(matches!(result, Err(ReconcileError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_revoke_order() {
        let store = InMemoryOrders::new();
        store.insert_order(Order::new("tok-1", "user-1", 100));
        store.revoke("tok-1", Utc::now()).unwrap();
        assert!(store.get_order("tok-1").await.unwrap().is_revoked());
        assert!(store.revoke("tok-2", Utc::now()).is_err());
    }

    #[tokio::test]
    async fn test_revocation_timestamp_is_kept() {
        let store = InMemoryOrders::new();
        store.insert_order(Order::new("tok-1", "user-1", 100));
        let first = Utc::now();
        store.revoke("tok-1", first).unwrap();
        store.revoke("tok-1", first + chrono::Duration::hours(1)).unwrap();
        assert_eq!(store.order("tok-1").unwrap().revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_authorization_counts() {
        let store = InMemoryOrders::new();
        assert_eq!(store.count_authorizations("tok-1").await.unwrap(), Some(0));
        store.record_authorization("tok-1");
        assert_eq!(store.record_authorization("tok-1"), 2);
        assert_eq!(store.count_authorizations("tok-1").await.unwrap(), Some(2));

        let untracked = InMemoryOrders::without_reuse_tracking();
        untracked.record_authorization("tok-1");
        assert_eq!(untracked.count_authorizations("tok-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_pending_orders_keep_enqueue_order() {
        let store = InMemoryOrders::new();
        for id in ["auth-c", "auth-a", "auth-b"] {
            store.enqueue(AuthorizeOrder::new(id, "tok", "user"));
        }
        let ids: Vec<String> = store
            .pending_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.authorization_uuid)
            .collect();
        assert_eq!(ids, vec!["auth-c", "auth-a", "auth-b"]);
    }

    #[tokio::test]
    async fn test_reenqueue_keeps_position() {
        let store = InMemoryOrders::new();
        store.enqueue(AuthorizeOrder::new("auth-a", "tok-1", "user"));
        store.enqueue(AuthorizeOrder::new("auth-b", "tok-1", "user"));
        store.enqueue(AuthorizeOrder::new("auth-a", "tok-2", "user"));

        let pending = store.pending_orders().await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].authorization_uuid, "auth-a");
        assert_eq!(pending[0].token_uuid, "tok-2");
        assert_eq!(pending[1].authorization_uuid, "auth-b");
    }

    #[tokio::test]
    async fn test_concurrent_enqueue_keeps_one_entry_per_authorization() {
        let store = InMemoryOrders::new();
        store.enqueue(AuthorizeOrder::new("auth-a", "tok-0", "user"));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let store = &store;
                scope.spawn(move || {
                    for round in 0..200 {
                        let token = format!("tok-{worker}-{round}");
                        store.enqueue(AuthorizeOrder::new("auth-b", token.as_str(), "user"));
                        store.enqueue(AuthorizeOrder::new("auth-a", token.as_str(), "user"));
                    }
                });
            }
        });

        assert_eq!(store.pending_count(), 2);
        let ids: Vec<String> = store
            .pending_orders()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.authorization_uuid)
            .collect();
        assert_eq!(ids, vec!["auth-a", "auth-b"]);
        assert_eq!(store.next_seq.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_confirmed_orders_are_not_pending() {
        let store = InMemoryOrders::new();
        store.enqueue(AuthorizeOrder::new("auth-1", "tok", "user"));
        store.enqueue(AuthorizeOrder::new("auth-2", "tok", "user"));

        let confirmed = store.confirm("auth-1", "00-000").unwrap();
        assert!(confirmed.is_confirmed);
        assert_eq!(confirmed.status_code.as_deref(), Some("00-000"));
        assert_eq!(store.pending_count(), 1);

        store.remove("auth-2");
        assert!(store.pending_orders().await.unwrap().is_empty());
        assert!(store.confirm("auth-2", "00-000").is_none());
    }
}
