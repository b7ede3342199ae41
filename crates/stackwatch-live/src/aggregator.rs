//! Pure merge of every source into one [`AggregatedStackView`].
//!
//! Sources are scheduled independently, so updates can arrive in any order.
//! The aggregator makes that safe: blocks go through the monotonic watcher,
//! and a receipt is only accepted for the hash that is current when it lands.

use std::sync::Arc;

use stackwatch_core::{StackIdentity, TxHash};
use stackwatch_node::{ForkOrigin, NodeIntrospection, TxOutcome};
use tracing::{debug, trace};

use crate::block::BlockNotification;
use crate::view::{AggregatedStackView, Resolution};
use crate::watcher::{BlockWatcher, WatcherEvent};

/// One message from a source task.
#[derive(Debug, Clone)]
pub enum SourceUpdate {
    /// The head subscription is (re-)established.
    Subscribed,
    Block(BlockNotification),
    /// Receipt lookup for `hash` finished; `None` if it never became available.
    Receipt {
        hash: TxHash,
        outcome: Option<TxOutcome>,
    },
    Introspection(Resolution<NodeIntrospection>),
    ForkOrigin(Resolution<ForkOrigin>),
}

/// What the caller should do after [`StackAggregator::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Nothing changed.
    Ignored,
    /// The view changed.
    Changed,
    /// The view changed; look up the receipt of this hash.
    FetchReceipt(TxHash),
    /// The view changed; resolve the fork origin for this URL (`None`: not a fork).
    ResolveForkOrigin(Option<String>),
}

#[derive(Debug)]
pub struct StackAggregator {
    watcher: BlockWatcher,
    view: AggregatedStackView,
    /// Fork URL from the stack record, which wins over introspection.
    record_fork_url: Option<String>,
    fork_requested: bool,
    torn_down: bool,
}

impl StackAggregator {
    pub fn new(identity: Arc<StackIdentity>, fork_url: Option<String>) -> Self {
        Self {
            watcher: BlockWatcher::new(),
            view: AggregatedStackView::new(identity),
            record_fork_url: fork_url.filter(|u| !u.is_empty()),
            fork_requested: false,
            torn_down: false,
        }
    }

    pub fn view(&self) -> &AggregatedStackView {
        &self.view
    }

    pub fn watcher(&self) -> &BlockWatcher {
        &self.watcher
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Fork lookup that can start right away, from the stack record's URL.
    pub fn initial_fork_lookup(&mut self) -> Option<String> {
        if self.fork_requested || self.torn_down {
            return None;
        }
        let url = self.record_fork_url.clone()?;
        self.fork_requested = true;
        Some(url)
    }

    /// Stop accepting updates. The view keeps its last state.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.watcher.unsubscribe();
    }

    pub fn apply(&mut self, update: SourceUpdate) -> Applied {
        if self.torn_down {
            trace!(slug = %self.view.identity.slug, "update after teardown ignored");
            return Applied::Ignored;
        }

        match update {
            SourceUpdate::Subscribed => {
                self.watcher.subscribed();
                Applied::Ignored
            }
            SourceUpdate::Block(block) => self.apply_block(&block),
            SourceUpdate::Receipt { hash, outcome } => self.apply_receipt(hash, outcome),
            SourceUpdate::Introspection(resolution) => self.apply_introspection(resolution),
            SourceUpdate::ForkOrigin(resolution) => {
                if self.view.fork_origin == resolution {
                    return Applied::Ignored;
                }
                self.view.fork_origin = resolution;
                Applied::Changed
            }
        }
    }

    fn apply_block(&mut self, block: &BlockNotification) -> Applied {
        let Some(event) = self.watcher.apply(block) else {
            return Applied::Ignored;
        };
        self.view.live = self.watcher.live().clone();

        match event {
            WatcherEvent::BlockAccepted { .. } => Applied::Changed,
            WatcherEvent::TxHashChanged { hash, .. } => {
                // The old outcome belongs to the old hash.
                self.view.tx_outcome = None;
                Applied::FetchReceipt(hash)
            }
        }
    }

    fn apply_receipt(&mut self, hash: TxHash, outcome: Option<TxOutcome>) -> Applied {
        if self.view.live.latest_tx_hash != Some(hash) {
            debug!(
                slug = %self.view.identity.slug,
                hash = %hash,
                "superseded receipt discarded"
            );
            return Applied::Ignored;
        }
        let Some(outcome) = outcome else {
            return Applied::Ignored;
        };
        if self.view.tx_outcome == Some(outcome) {
            return Applied::Ignored;
        }
        self.view.tx_outcome = Some(outcome);
        Applied::Changed
    }

    fn apply_introspection(&mut self, resolution: Resolution<NodeIntrospection>) -> Applied {
        // A failed refresh keeps the last good snapshot.
        if let (Resolution::Unavailable(reason), Resolution::Ready(_)) =
            (&resolution, &self.view.introspection)
        {
            debug!(slug = %self.view.identity.slug, reason = %reason, "introspection refresh failed; keeping last snapshot");
            return Applied::Ignored;
        }
        if self.view.introspection == resolution {
            return Applied::Ignored;
        }

        // Only a successful pull says whether the node is a fork. Until then
        // the fork origin stays pending.
        let fork_url = match &resolution {
            Resolution::Ready(info) => Some(info.fork_url().map(str::to_string)),
            Resolution::Unavailable(_) | Resolution::Pending => None,
        };
        self.view.introspection = resolution;

        match fork_url {
            Some(url) if !self.fork_requested && self.record_fork_url.is_none() => {
                self.fork_requested = true;
                Applied::ResolveForkOrigin(url)
            }
            _ => Applied::Changed,
        }
    }
}
