//! Block/tx watcher: folds head notifications into [`LiveBlockState`].
//!
//! "Latest transaction" means the last transaction, in inclusion order, of the
//! newest block that had any. Earlier transactions of the same block are not
//! tracked. This is a product-level simplification: a dev chain usually mines
//! one transaction per block.

use stackwatch_core::TxHash;
use tracing::trace;

use crate::block::BlockNotification;
use crate::view::LiveBlockState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Uninitialized,
    /// Subscribed, no block accepted yet.
    Subscribed,
    Updating,
    /// Terminal; every later notification is ignored.
    Unsubscribed,
}

/// What accepting a block changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherEvent {
    /// Newer block accepted; the latest transaction hash is unchanged.
    BlockAccepted { number: u64, timestamp: u64 },
    /// Newer block accepted and it moved the latest transaction hash.
    TxHashChanged {
        number: u64,
        timestamp: u64,
        hash: TxHash,
    },
}

impl WatcherEvent {
    pub fn number(&self) -> u64 {
        match self {
            Self::BlockAccepted { number, .. } | Self::TxHashChanged { number, .. } => *number,
        }
    }

    pub fn new_tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::TxHashChanged { hash, .. } => Some(*hash),
            Self::BlockAccepted { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct BlockWatcher {
    state: WatcherState,
    live: LiveBlockState,
}

impl Default for BlockWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockWatcher {
    pub fn new() -> Self {
        Self {
            state: WatcherState::Uninitialized,
            live: LiveBlockState::default(),
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn live(&self) -> &LiveBlockState {
        &self.live
    }

    /// The head subscription is established. Re-subscribing keeps state.
    pub fn subscribed(&mut self) {
        if self.state == WatcherState::Uninitialized {
            self.state = WatcherState::Subscribed;
        }
    }

    pub fn unsubscribe(&mut self) {
        self.state = WatcherState::Unsubscribed;
    }

    /// Fold one notification in. Returns `None` when it changed nothing.
    pub fn apply(&mut self, block: &BlockNotification) -> Option<WatcherEvent> {
        match self.state {
            WatcherState::Uninitialized | WatcherState::Unsubscribed => {
                trace!(block = block.number, state = ?self.state, "notification ignored");
                return None;
            }
            WatcherState::Subscribed | WatcherState::Updating => {}
        }

        if let Some(last) = self.live.latest_block_number {
            if block.number <= last {
                trace!(block = block.number, last, "stale or duplicate block discarded");
                return None;
            }
        }

        self.state = WatcherState::Updating;
        self.live.latest_block_number = Some(block.number);
        self.live.latest_block_timestamp = Some(block.timestamp);

        match block.last_transaction() {
            Some(hash) if self.live.latest_tx_hash != Some(hash) => {
                self.live.latest_tx_hash = Some(hash);
                Some(WatcherEvent::TxHashChanged {
                    number: block.number,
                    timestamp: block.timestamp,
                    hash,
                })
            }
            _ => Some(WatcherEvent::BlockAccepted {
                number: block.number,
                timestamp: block.timestamp,
            }),
        }
    }
}
