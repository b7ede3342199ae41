//! WebSocket subscription bookkeeping.
//!
//! Callers hold a local [`SubscriptionId`] that stays valid across reconnects.
//! The node-assigned id changes every time the subscription is re-created, so
//! the manager keeps a second index from server id to local id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::mpsc;

/// Local, reconnect-stable handle for one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

struct Entry {
    /// The subscription type (e.g. `"newHeads"`).
    kind: String,
    /// Extra `eth_subscribe` params, replayed on re-subscribe.
    params: Vec<Value>,
    /// Id assigned by the node for the current connection, if bound.
    server_id: Option<String>,
    sender: mpsc::UnboundedSender<Value>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<SubscriptionId, Entry>,
    by_server: HashMap<String, SubscriptionId>,
}

/// Manages active WebSocket subscriptions and supports re-subscription.
#[derive(Clone, Default)]
pub struct SubscriptionManager {
    inner: Arc<Mutex<Inner>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription that has not been bound to a server id yet.
    pub fn register(
        &self,
        id: SubscriptionId,
        kind: String,
        params: Vec<Value>,
    ) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().unwrap().entries.insert(
            id,
            Entry {
                kind,
                params,
                server_id: None,
                sender: tx,
            },
        );
        rx
    }

    /// Bind `id` to the id the node returned from `eth_subscribe`.
    ///
    /// Returns `false` if the subscription was removed in the meantime.
    pub fn bind(&self, id: SubscriptionId, server_id: String) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let Some(entry) = inner.entries.get_mut(&id) else {
            return false;
        };
        entry.server_id = Some(server_id.clone());
        inner.by_server.insert(server_id, id);
        true
    }

    /// Forward an `eth_subscription` notification to its subscriber.
    pub fn dispatch(&self, server_id: &str, message: Value) {
        let inner = self.inner.lock().unwrap();
        let Some(id) = inner.by_server.get(server_id) else {
            tracing::trace!(server_id, "notification for unknown subscription");
            return;
        };
        if let Some(entry) = inner.entries.get(id) {
            let _ = entry.sender.send(message);
        }
    }

    /// Remove a subscription. Returns the server id it was bound to, if any,
    /// so the caller can send `eth_unsubscribe`.
    pub fn remove(&self, id: SubscriptionId) -> Option<String> {
        let mut inner = self.inner.lock().unwrap();
        let server_id = inner.entries.remove(&id)?.server_id;
        if let Some(sid) = &server_id {
            inner.by_server.remove(sid);
        }
        server_id
    }

    /// Forget every server id. Called when the connection drops.
    pub fn unbind_all(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.by_server.clear();
        for entry in inner.entries.values_mut() {
            entry.server_id = None;
        }
    }

    /// `(id, kind, params)` for every subscription, for re-subscribing after
    /// a reconnect.
    pub fn active_subscriptions(&self) -> Vec<(SubscriptionId, String, Vec<Value>)> {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|(id, e)| (*id, e.kind.clone(), e.params.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_requires_binding() {
        let mgr = SubscriptionManager::new();
        let id = SubscriptionId(1);
        let mut rx = mgr.register(id, "newHeads".into(), vec![]);

        mgr.dispatch("0xdead", serde_json::json!({"number": "0x1"}));
        assert!(rx.try_recv().is_err());

        assert!(mgr.bind(id, "0xdead".into()));
        mgr.dispatch("0xdead", serde_json::json!({"number": "0x2"}));
        assert_eq!(rx.try_recv().unwrap()["number"], "0x2");
    }

    #[test]
    fn rebinding_after_reconnect_keeps_local_id() {
        let mgr = SubscriptionManager::new();
        let id = SubscriptionId(7);
        let mut rx = mgr.register(id, "newHeads".into(), vec![]);
        mgr.bind(id, "0xold".into());

        mgr.unbind_all();
        mgr.dispatch("0xold", serde_json::json!(1));
        assert!(rx.try_recv().is_err());

        let active = mgr.active_subscriptions();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, id);

        mgr.bind(id, "0xnew".into());
        mgr.dispatch("0xnew", serde_json::json!(2));
        assert_eq!(rx.try_recv().unwrap(), serde_json::json!(2));
    }

    #[test]
    fn remove_returns_server_id_and_stops_dispatch() {
        let mgr = SubscriptionManager::new();
        let id = SubscriptionId(3);
        let mut rx = mgr.register(id, "newHeads".into(), vec![]);
        mgr.bind(id, "0xabc".into());

        assert_eq!(mgr.remove(id).as_deref(), Some("0xabc"));
        assert!(mgr.is_empty());
        assert!(!mgr.bind(id, "0xlate".into()));

        mgr.dispatch("0xabc", serde_json::json!(1));
        // Sender was dropped with the entry.
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
