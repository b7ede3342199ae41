//! Building transports for URLs discovered at runtime (a stack's RPC, the
//! upstream a stack was forked from).

use stackwatch_core::{RpcTransport, TransportError};
use stackwatch_http::{HttpClientConfig, HttpRpcClient};

use crate::client::NodeClient;
use crate::error::NodeError;
use crate::types::NodeIntrospection;

/// Creates a transport for an arbitrary endpoint URL.
pub trait Connector: Send + Sync + 'static {
    type Transport: RpcTransport;

    fn connect(&self, url: &str) -> Result<Self::Transport, TransportError>;
}

/// [`Connector`] producing HTTP clients.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    config: HttpClientConfig,
}

impl HttpConnector {
    pub fn new(config: HttpClientConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    type Transport = HttpRpcClient;

    fn connect(&self, url: &str) -> Result<HttpRpcClient, TransportError> {
        HttpRpcClient::new(url, self.config.clone())
    }
}

/// One-shot `anvil_nodeInfo` against `rpc_url` over HTTP.
pub async fn get_node_info(rpc_url: &str) -> Result<NodeIntrospection, NodeError> {
    let transport = HttpConnector::default()
        .connect(rpc_url)
        .map_err(NodeError::Transport)?;
    NodeClient::new(transport).node_info().await
}

/// One-shot `eth_chainId` against `rpc_url` over HTTP.
pub async fn get_chain_id(rpc_url: &str) -> Result<u32, NodeError> {
    let transport = HttpConnector::default()
        .connect(rpc_url)
        .map_err(NodeError::Transport)?;
    NodeClient::new(transport).chain_id().await
}
