//! stackwatch-core: foundation traits and types for stackwatch.
//!
//! # Overview
//!
//! stackwatch follows short-lived anvil development chains ("stacks") and
//! keeps a live view of what each one is doing. The core crate defines:
//!
//! - [`RpcTransport`]: the async trait every JSON-RPC transport implements
//! - [`JsonRpcRequest`] / [`JsonRpcResponse`]: wire types
//! - [`TransportError`]: structured transport error type
//! - [`policy`] module: retry / backoff policy
//! - [`stack`] module: the stack record and its immutable identity

pub mod error;
pub mod hex;
pub mod policy;
pub mod request;
pub mod stack;
pub mod transport;

pub use error::TransportError;
pub use request::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, RpcId, RpcParam};
pub use stack::{AnvilOpts, StackIdentity, StackRecord, StackStatus, TxHash};
pub use transport::RpcTransport;
