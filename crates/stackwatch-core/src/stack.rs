//! Stack records as served by the stacks API, and the immutable identity the
//! live view is keyed on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Transaction hash.
pub type TxHash = alloy_primitives::B256;

/// Lifecycle status reported by the stacks API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackStatus {
    Running,
    Stopped,
}

/// Anvil launch options of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnvilOpts {
    /// Upstream RPC the stack was forked from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_url: Option<String>,
    /// Upstream block the fork was taken at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_block_number: Option<u64>,
}

/// A stack record as returned by `GET /stacks/{slug}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRecord {
    pub slug: String,
    pub status: StackStatus,
    pub chain_id: u64,
    pub rpc_url: String,
    pub ws_rpc: String,
    pub explorer_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anvil_opts: Option<AnvilOpts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_url: Option<String>,
    /// Unix seconds.
    pub inserted_at: i64,
    /// Unix seconds.
    pub updated_at: i64,
}

impl StackRecord {
    /// The fork URL, if this stack was forked from an upstream network.
    ///
    /// An empty string is treated the same as an absent URL.
    pub fn fork_url(&self) -> Option<&str> {
        self.anvil_opts
            .as_ref()
            .and_then(|o| o.fork_url.as_deref())
            .filter(|u| !u.is_empty())
    }

    pub fn identity(&self) -> StackIdentity {
        StackIdentity {
            slug: self.slug.clone(),
            chain_id: self.chain_id,
            rpc_url: self.rpc_url.clone(),
            ws_url: self.ws_rpc.clone(),
        }
    }
}

/// Immutable reference to a stack: everything needed to talk to its node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackIdentity {
    pub slug: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub ws_url: String,
}

impl fmt::Display for StackIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain {})", self.slug, self.chain_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "slug": "dev-mainnet",
        "status": "running",
        "chain_id": 31337,
        "rpc_url": "https://dev-mainnet.stacks.ethui.dev",
        "ws_rpc": "wss://dev-mainnet.stacks.ethui.dev",
        "explorer_url": "https://explorer.ethui.dev",
        "anvil_opts": { "fork_url": "https://eth.llamarpc.com", "fork_block_number": 19000000 },
        "inserted_at": 1718000000,
        "updated_at": 1718003600
    }"#;

    #[test]
    fn record_deserializes_and_exposes_fork() {
        let rec: StackRecord = serde_json::from_str(RECORD).unwrap();
        assert_eq!(rec.status, StackStatus::Running);
        assert_eq!(rec.fork_url(), Some("https://eth.llamarpc.com"));
        assert!(rec.graph_url.is_none());

        let id = rec.identity();
        assert_eq!(id.slug, "dev-mainnet");
        assert_eq!(id.ws_url, "wss://dev-mainnet.stacks.ethui.dev");
        assert_eq!(id.to_string(), "dev-mainnet (chain 31337)");
    }

    #[test]
    fn missing_or_empty_fork_url_is_not_a_fork() {
        let mut rec: StackRecord = serde_json::from_str(RECORD).unwrap();
        rec.anvil_opts = None;
        assert_eq!(rec.fork_url(), None);

        rec.anvil_opts = Some(AnvilOpts {
            fork_url: Some(String::new()),
            fork_block_number: None,
        });
        assert_eq!(rec.fork_url(), None);
    }
}
