//! Fork origin resolution: which upstream network a stack was forked from.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::client::NodeClient;
use crate::connector::Connector;
use crate::error::NodeError;

/// Result of resolving a stack's fork origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "chain_id", rename_all = "snake_case")]
pub enum ForkOrigin {
    /// The stack has no fork URL; nothing to look up.
    NotApplicable,
    /// Chain id reported by the fork URL.
    ChainId(u32),
}

impl ForkOrigin {
    pub fn chain_id(&self) -> Option<u32> {
        match self {
            Self::ChainId(id) => Some(*id),
            Self::NotApplicable => None,
        }
    }
}

/// Resolves `eth_chainId` of fork URLs, caching successes per stack slug.
///
/// Failures are not cached, so a later call retries the upstream.
pub struct ForkOriginResolver<C> {
    connector: C,
    cache: Mutex<HashMap<String, u32>>,
}

impl<C: Connector> ForkOriginResolver<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Cached chain id for `slug`, if a previous lookup succeeded.
    pub fn cached(&self, slug: &str) -> Option<u32> {
        self.cache.lock().unwrap().get(slug).copied()
    }

    /// Resolve the fork origin of `slug`.
    ///
    /// Without a fork URL this returns [`ForkOrigin::NotApplicable`] and
    /// issues no request at all.
    pub async fn resolve(&self, slug: &str, fork_url: Option<&str>) -> Result<ForkOrigin, NodeError> {
        let Some(fork_url) = fork_url.filter(|u| !u.is_empty()) else {
            return Ok(ForkOrigin::NotApplicable);
        };
        if let Some(id) = self.cached(slug) {
            return Ok(ForkOrigin::ChainId(id));
        }

        let transport = self
            .connector
            .connect(fork_url)
            .map_err(NodeError::Transport)?;
        let id = NodeClient::new(transport).chain_id().await?;

        tracing::debug!(slug, fork_chain_id = id, "resolved fork origin");
        self.cache.lock().unwrap().insert(slug.to_string(), id);
        Ok(ForkOrigin::ChainId(id))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use stackwatch_core::TransportError;

    use super::*;
    use crate::client::tests::MockNode;

    #[derive(Clone)]
    struct MockConnector {
        node: MockNode,
        connects: Arc<AtomicUsize>,
    }

    impl MockConnector {
        fn new(node: MockNode) -> Self {
            Self {
                node,
                connects: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Connector for MockConnector {
        type Transport = MockNode;

        fn connect(&self, _url: &str) -> Result<MockNode, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(self.node.clone())
        }
    }

    #[tokio::test]
    async fn absent_fork_url_issues_no_rpc() {
        let connector = MockConnector::new(MockNode::default());
        let resolver = ForkOriginResolver::new(connector.clone());

        assert_eq!(
            resolver.resolve("plain", None).await.unwrap(),
            ForkOrigin::NotApplicable
        );
        assert_eq!(
            resolver.resolve("plain", Some("")).await.unwrap(),
            ForkOrigin::NotApplicable
        );
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
        assert_eq!(connector.node.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn resolves_once_and_caches_per_slug() {
        let node = MockNode::default().answer("eth_chainId", json!("0x1"));
        let connector = MockConnector::new(node);
        let resolver = ForkOriginResolver::new(connector.clone());

        let url = Some("https://eth.llamarpc.com");
        assert_eq!(resolver.resolve("dev", url).await.unwrap(), ForkOrigin::ChainId(1));
        assert_eq!(resolver.resolve("dev", url).await.unwrap(), ForkOrigin::ChainId(1));
        assert_eq!(connector.node.calls.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.cached("dev"), Some(1));
    }

    #[tokio::test]
    async fn failed_lookup_is_an_error_not_not_applicable() {
        let node = MockNode::default().fail("eth_chainId", -32000, "upstream down");
        let resolver = ForkOriginResolver::new(MockConnector::new(node));

        let err = resolver
            .resolve("dev", Some("https://broken.example"))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Rpc { .. }));
        assert_eq!(resolver.cached("dev"), None);
    }
}
