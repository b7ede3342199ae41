//! Reliability policies shared by the transports.
//!
//! The HTTP client retries transient failures with [`RetryPolicy`]; the
//! WebSocket client reuses the same exponential curve for reconnects, and the
//! live aggregator uses it to poll for receipts that are not yet available.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy};
