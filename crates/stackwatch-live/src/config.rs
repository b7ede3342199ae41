use std::time::Duration;

use stackwatch_core::policy::RetryConfig;

/// Tuning for a [`LiveStack`](crate::LiveStack).
#[derive(Debug, Clone)]
pub struct LiveConfig {
    /// Re-pull `anvil_nodeInfo` this often. `None` pulls once.
    pub introspection_refresh: Option<Duration>,
    /// Schedule for re-asking a receipt the node does not have yet.
    pub receipt_retry: RetryConfig,
    /// Backoff between attempts to (re-)subscribe to heads.
    pub resubscribe: RetryConfig,
    /// Capacity of the update channel into the aggregator.
    pub channel_capacity: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            introspection_refresh: None,
            receipt_retry: RetryConfig::bounded(
                5,
                Duration::from_millis(250),
                Duration::from_secs(4),
            ),
            resubscribe: RetryConfig::unbounded(Duration::from_millis(500), Duration::from_secs(30)),
            channel_capacity: 256,
        }
    }
}
