//! stackwatch-http: HTTP JSON-RPC transport backed by `reqwest`.
//!
//! Used for every pull-based call: `anvil_nodeInfo`, `eth_chainId` against a
//! stack or its fork origin, and receipt lookups.

pub mod client;

pub use client::{HttpClientConfig, HttpRpcClient};
