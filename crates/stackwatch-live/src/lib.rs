//! stackwatch-live: the live view of one stack.
//!
//! Combines the chain-head subscription with pulled node data into a single
//! [`AggregatedStackView`]:
//!
//! - [`BlockWatcher`] folds heads into [`LiveBlockState`], monotonically
//! - [`StackAggregator`] merges blocks, receipts, introspection and fork
//!   origin, discarding anything that arrives out of date
//! - [`LiveStack`] runs the sources as Tokio tasks and publishes the view on a
//!   `watch` channel
//!
//! The watcher and the aggregator are plain state machines; all I/O lives in
//! [`runtime`] and [`source`].

pub mod aggregator;
pub mod block;
pub mod config;
pub mod error;
pub mod runtime;
pub mod source;
pub mod view;
pub mod watcher;

pub use aggregator::{Applied, SourceUpdate, StackAggregator};
pub use block::BlockNotification;
pub use config::LiveConfig;
pub use error::LiveError;
pub use runtime::{LiveSources, LiveStack};
pub use source::{BlockSource, BlockStream, WsBlockSource};
pub use view::{AggregatedStackView, LiveBlockState, Resolution};
pub use watcher::{BlockWatcher, WatcherEvent, WatcherState};
