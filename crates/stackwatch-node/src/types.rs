//! Validated node data.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stackwatch_core::TxHash;

use crate::wire::NodeInfoWire;

/// Snapshot returned by `anvil_nodeInfo`.
///
/// Pulled on demand, so it may lag behind the block subscription. Parsed only
/// from anvil's camelCase wire shape through [`NodeIntrospection::from_node_info`];
/// the snake_case `Serialize` output is for display and is not read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeIntrospection {
    pub current_block_number: u64,
    pub current_block_timestamp: u64,
    pub current_block_hash: TxHash,
    pub hard_fork: String,
    pub transaction_order: String,
    pub environment: NodeEnvironment,
    /// `None` when the stack is not a fork.
    pub fork_config: Option<ForkConfig>,
}

impl NodeIntrospection {
    /// Validate a raw `anvil_nodeInfo` result.
    pub fn from_node_info(raw: Value) -> Result<Self, String> {
        let wire: NodeInfoWire = serde_json::from_value(raw).map_err(|e| e.to_string())?;
        Self::try_from(wire)
    }

    pub fn fork_url(&self) -> Option<&str> {
        self.fork_config.as_ref().map(|f| f.fork_url.as_str())
    }
}

/// Gas and chain parameters of the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEnvironment {
    pub base_fee: u128,
    pub chain_id: u64,
    pub gas_limit: u128,
    pub gas_price: u128,
}

/// Where and when the node was forked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkConfig {
    pub fork_url: String,
    pub fork_block_number: u64,
    /// Backoff anvil applies to upstream requests, in milliseconds.
    pub fork_retry_backoff: Option<u64>,
}

/// Success or failure of a mined transaction, from its receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutcome {
    pub hash: TxHash,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn local_node_info() -> Value {
        json!({
            "currentBlockNumber": "0x2a",
            "currentBlockTimestamp": 1718000000,
            "currentBlockHash": "0x0000000000000000000000000000000000000000000000000000000000000abc",
            "hardFork": "prague",
            "transactionOrder": "fees",
            "environment": {
                "baseFee": "0x3b9aca00",
                "chainId": 31337,
                "gasLimit": "0x1c9c380",
                "gasPrice": "0x77359400"
            },
            "forkConfig": null
        })
    }

    #[test]
    fn parses_wire_shape_and_displays_snake_case() {
        let info = NodeIntrospection::from_node_info(local_node_info()).unwrap();
        assert_eq!(info.current_block_number, 42);
        assert_eq!(info.fork_url(), None);

        let shown = serde_json::to_value(&info).unwrap();
        assert_eq!(shown["current_block_number"], 42);
        assert_eq!(shown["environment"]["chain_id"], 31337);
        assert!(shown.get("currentBlockNumber").is_none());
    }

    #[test]
    fn rejects_missing_wire_fields() {
        let mut raw = local_node_info();
        raw.as_object_mut().unwrap().remove("hardFork");
        let err = NodeIntrospection::from_node_info(raw).unwrap_err();
        assert!(err.contains("hardFork"), "{err}");
    }
}
