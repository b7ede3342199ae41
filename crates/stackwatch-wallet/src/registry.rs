//! Provider registry: the set of wallets currently announced.
//!
//! The registry owns a listener task fed by a [`DiscoveryBus`]; every
//! announcement or retraction updates the list and notifies subscribers with
//! the full, current list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::discovery::{DiscoveryBus, DiscoveryEvent};
use crate::provider::ProviderRecord;

type Callback = Arc<dyn Fn(&[ProviderRecord]) + Send + Sync>;

#[derive(Default)]
struct State {
    providers: Vec<ProviderRecord>,
    subscribers: HashMap<u64, Callback>,
    next_subscriber: u64,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Registry of discovered wallet providers. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    inner: Arc<Inner>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the announcement listener and ask providers to announce.
    ///
    /// Returns `false` (and does nothing) if already initialised. Must be
    /// called from within a Tokio runtime.
    pub fn init(&self, bus: Arc<dyn DiscoveryBus>) -> bool {
        let mut listener = self.inner.listener.lock().unwrap();
        if listener.is_some() {
            debug!("provider registry already initialised");
            return false;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.listen(tx);

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        *listener = Some(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                ProviderRegistry { inner }.apply(event);
            }
        }));
        drop(listener);

        bus.request_providers();
        info!("provider registry initialised");
        true
    }

    /// Stop listening and drop every provider and subscriber.
    pub fn dispose(&self) {
        if let Some(handle) = self.inner.listener.lock().unwrap().take() {
            handle.abort();
        }
        let mut state = self.inner.state.lock().unwrap();
        state.providers.clear();
        state.subscribers.clear();
        debug!("provider registry disposed");
    }

    pub fn is_initialised(&self) -> bool {
        self.inner.listener.lock().unwrap().is_some()
    }

    /// Apply one discovery event and notify subscribers if the list changed.
    pub fn apply(&self, event: DiscoveryEvent) {
        let (snapshot, callbacks) = {
            let mut state = self.inner.state.lock().unwrap();
            match event {
                DiscoveryEvent::Announce(record) => {
                    debug!(provider = %record.name, uuid = %record.uuid, "provider announced");
                    state.providers.retain(|p| p.uuid != record.uuid);
                    state.providers.push(record);
                }
                DiscoveryEvent::Retract { uuid } => {
                    let before = state.providers.len();
                    state.providers.retain(|p| p.uuid != uuid);
                    if state.providers.len() == before {
                        return;
                    }
                    debug!(uuid = %uuid, "provider retracted");
                }
            }
            let callbacks: Vec<Callback> = state.subscribers.values().cloned().collect();
            (state.providers.clone(), callbacks)
        };

        // Callbacks run outside the lock so they may call back into the registry.
        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Current providers in announcement order.
    pub fn list_providers(&self) -> Vec<ProviderRecord> {
        self.inner.state.lock().unwrap().providers.clone()
    }

    pub fn get(&self, uuid: &str) -> Option<ProviderRecord> {
        self.inner
            .state
            .lock()
            .unwrap()
            .providers
            .iter()
            .find(|p| p.uuid == uuid)
            .cloned()
    }

    /// Call `on_change` with the full list after every change.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(&[ProviderRecord]) + Send + Sync + 'static,
    {
        let mut state = self.inner.state.lock().unwrap();
        let id = state.next_subscriber;
        state.next_subscriber += 1;
        state.subscribers.insert(id, Arc::new(on_change));
        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().unwrap().subscribers.len()
    }
}

/// Handle returned by [`ProviderRegistry::subscribe`]; unsubscribes on drop.
pub struct Subscription {
    registry: Weak<Inner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.state.lock().unwrap().subscribers.remove(&self.id);
        }
    }
}
