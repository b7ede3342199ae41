use stackwatch_core::TransportError;
use stackwatch_node::NodeError;
use thiserror::Error;

/// Errors produced by live block sources.
#[derive(Debug, Error)]
pub enum LiveError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Node(#[from] NodeError),

    /// A block or head payload did not have the expected shape.
    #[error("malformed block: {0}")]
    MalformedBlock(String),

    /// The node returned `null` for a block it announced.
    #[error("block {0} not found")]
    BlockNotFound(String),
}
