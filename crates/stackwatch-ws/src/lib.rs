//! stackwatch-ws: WebSocket JSON-RPC transport with auto-reconnect.
//!
//! # Features
//! - Auto-reconnect on disconnect (exponential backoff)
//! - `eth_subscribe` / `eth_unsubscribe` with stable local subscription ids
//! - Transparent re-subscribe after reconnect
//! - Request multiplexing over a single connection

pub mod client;
pub mod subscriptions;

pub use client::{Subscription, WsClientConfig, WsRpcClient};
pub use subscriptions::{SubscriptionId, SubscriptionManager};
