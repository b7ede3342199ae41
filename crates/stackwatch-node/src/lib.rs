//! stackwatch-node: pull-based queries against anvil nodes.
//!
//! - [`NodeClient`]: `anvil_nodeInfo`, `eth_chainId` and receipt lookups
//!   over any [`RpcTransport`](stackwatch_core::RpcTransport)
//! - [`ForkOriginResolver`]: chain id of the network a stack was forked
//!   from, cached per stack
//! - [`chains`]: display names for well-known chain ids
//!
//! Every response is validated against a typed model before it is accepted;
//! a response that does not fit fails that call only, as
//! [`NodeError::MalformedResponse`].

pub mod chains;
pub mod client;
pub mod connector;
pub mod error;
pub mod fork;
pub mod types;
mod wire;

pub use chains::chain_name;
pub use client::NodeClient;
pub use connector::{get_chain_id, get_node_info, Connector, HttpConnector};
pub use error::NodeError;
pub use fork::{ForkOrigin, ForkOriginResolver};
pub use types::{ForkConfig, NodeEnvironment, NodeIntrospection, TxOutcome};
