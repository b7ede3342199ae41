//! Provider discovery events and the bus they arrive on.

use std::sync::Mutex;

use tokio::sync::mpsc;

use crate::provider::ProviderRecord;

#[derive(Debug, Clone)]
pub enum DiscoveryEvent {
    /// A provider announced itself (or re-announced with fresh info).
    Announce(ProviderRecord),
    /// A provider went away.
    Retract { uuid: String },
}

/// Where provider announcements come from.
///
/// In a browser this is the EIP-6963 window event pair; elsewhere it can be
/// anything that knows about reachable wallets.
pub trait DiscoveryBus: Send + Sync + 'static {
    /// Start forwarding events into `sink`. Called once per registry `init`.
    fn listen(&self, sink: mpsc::UnboundedSender<DiscoveryEvent>);

    /// Ask every provider to (re-)announce itself.
    fn request_providers(&self);
}

/// A bus over a fixed set of providers, announced on every request.
#[derive(Debug, Default)]
pub struct StaticDiscovery {
    providers: Vec<ProviderRecord>,
    sink: Mutex<Option<mpsc::UnboundedSender<DiscoveryEvent>>>,
}

impl StaticDiscovery {
    pub fn new(providers: Vec<ProviderRecord>) -> Self {
        Self {
            providers,
            sink: Mutex::new(None),
        }
    }
}

impl DiscoveryBus for StaticDiscovery {
    fn listen(&self, sink: mpsc::UnboundedSender<DiscoveryEvent>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn request_providers(&self) {
        let sink = self.sink.lock().unwrap();
        let Some(sink) = sink.as_ref() else {
            return;
        };
        for provider in &self.providers {
            if sink.send(DiscoveryEvent::Announce(provider.clone())).is_err() {
                return;
            }
        }
    }
}
