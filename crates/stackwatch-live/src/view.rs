//! The aggregated view published for each stack.

use std::sync::Arc;

use serde::Serialize;
use stackwatch_core::{StackIdentity, TxHash};
use stackwatch_node::{chain_name, ForkOrigin, NodeIntrospection, TxOutcome};

/// Latest head state, as accepted by the block watcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveBlockState {
    pub latest_block_number: Option<u64>,
    pub latest_block_timestamp: Option<u64>,
    pub latest_tx_hash: Option<TxHash>,
}

/// State of a value that is pulled rather than pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Resolution<T> {
    /// Not resolved yet.
    Pending,
    Ready(T),
    /// Resolution failed; the message says why.
    Unavailable(String),
}

impl<T> Default for Resolution<T> {
    fn default() -> Self {
        Self::Pending
    }
}

impl<T> Resolution<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Everything known about a stack right now. Nothing here is defaulted:
/// values that have not arrived are `None` or [`Resolution::Pending`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedStackView {
    pub identity: Arc<StackIdentity>,
    pub live: LiveBlockState,
    /// Outcome of `live.latest_tx_hash`, once its receipt is in.
    pub tx_outcome: Option<TxOutcome>,
    pub introspection: Resolution<NodeIntrospection>,
    pub fork_origin: Resolution<ForkOrigin>,
}

impl AggregatedStackView {
    pub fn new(identity: Arc<StackIdentity>) -> Self {
        Self {
            identity,
            live: LiveBlockState::default(),
            tx_outcome: None,
            introspection: Resolution::Pending,
            fork_origin: Resolution::Pending,
        }
    }

    /// Display name of the network the stack was forked from.
    pub fn fork_chain_name(&self) -> Option<String> {
        let id = self.fork_origin.ready()?.chain_id()?;
        Some(chain_name(u64::from(id)))
    }
}
