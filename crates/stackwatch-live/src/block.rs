//! Block notifications as the watcher consumes them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackwatch_core::{hex, TxHash};

use crate::error::LiveError;

/// A block as seen by the head subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNotification {
    pub number: u64,
    /// Unix seconds.
    pub timestamp: u64,
    /// Transaction hashes in inclusion order.
    pub transactions: Vec<TxHash>,
}

impl BlockNotification {
    pub fn new(number: u64, timestamp: u64, transactions: Vec<TxHash>) -> Self {
        Self {
            number,
            timestamp,
            transactions,
        }
    }

    /// Parse an `eth_getBlockByNumber` result.
    ///
    /// `transactions` may hold bare hashes or full transaction objects.
    pub fn from_json(block: &Value) -> Result<Self, LiveError> {
        let number = quantity(block, "number")?;
        let timestamp = quantity(block, "timestamp")?;

        let transactions = match block.get("transactions") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(tx_hash)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(LiveError::MalformedBlock(format!(
                    "transactions is not an array: {other}"
                )))
            }
        };

        Ok(Self {
            number,
            timestamp,
            transactions,
        })
    }

    /// Last transaction in inclusion order.
    pub fn last_transaction(&self) -> Option<TxHash> {
        self.transactions.last().copied()
    }
}

/// Block number announced by a `newHeads` notification.
pub fn head_number(head: &Value) -> Result<u64, LiveError> {
    quantity(head, "number")
}

fn quantity(obj: &Value, field: &str) -> Result<u64, LiveError> {
    let raw = obj
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| LiveError::MalformedBlock(format!("missing {field}")))?;
    hex::parse_u64(raw).map_err(|_| LiveError::MalformedBlock(format!("invalid {field} {raw:?}")))
}

fn tx_hash(item: &Value) -> Result<TxHash, LiveError> {
    let raw = match item {
        Value::String(s) => s.as_str(),
        Value::Object(tx) => tx
            .get("hash")
            .and_then(Value::as_str)
            .ok_or_else(|| LiveError::MalformedBlock("transaction without hash".into()))?,
        other => {
            return Err(LiveError::MalformedBlock(format!(
                "unexpected transaction entry {other}"
            )))
        }
    };
    raw.parse()
        .map_err(|_| LiveError::MalformedBlock(format!("invalid transaction hash {raw:?}")))
}
