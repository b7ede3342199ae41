//! `stackwatch watch`: follow a stack until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use stackwatch_core::StackRecord;
use stackwatch_http::{HttpClientConfig, HttpRpcClient};
use stackwatch_live::{AggregatedStackView, LiveConfig, LiveSources, LiveStack, Resolution, WsBlockSource};
use stackwatch_node::{ForkOrigin, ForkOriginResolver, HttpConnector, NodeClient};
use stackwatch_ws::{WsClientConfig, WsRpcClient};

pub async fn run(stack: &StackRecord, config: LiveConfig, as_json: bool) -> Result<()> {
    let identity = Arc::new(stack.identity());

    let ws = Arc::new(WsRpcClient::connect(
        identity.ws_url.clone(),
        WsClientConfig::default(),
    ));
    let http = HttpRpcClient::new(identity.rpc_url.clone(), HttpClientConfig::default())
        .with_context(|| format!("building HTTP client for {}", identity.rpc_url))?;

    let sources = LiveSources {
        blocks: Arc::new(WsBlockSource::new(ws)),
        node: Arc::new(NodeClient::new(http)),
        fork: Arc::new(ForkOriginResolver::new(HttpConnector::default())),
    };
    let live = LiveStack::spawn(
        Arc::clone(&identity),
        stack.fork_url().map(str::to_string),
        sources,
        config,
    );

    let mut changes = live.changes();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = changes.borrow_and_update().clone();
                if as_json {
                    println!("{}", serde_json::to_string(&view)?);
                } else {
                    println!("{}", render(&view));
                }
            }
        }
    }

    live.shutdown().await;
    Ok(())
}

/// One status line per view.
fn render(view: &AggregatedStackView) -> String {
    let block = match (view.live.latest_block_number, view.live.latest_block_timestamp) {
        (Some(n), Some(ts)) => format!("block {n} @ {ts}"),
        _ => "block -".to_string(),
    };

    let tx = match (view.live.latest_tx_hash, view.tx_outcome) {
        (None, _) => "tx -".to_string(),
        (Some(hash), Some(outcome)) if outcome.success => format!("tx {hash} success"),
        (Some(hash), Some(_)) => format!("tx {hash} reverted"),
        (Some(hash), None) => format!("tx {hash} pending"),
    };

    let node = match &view.introspection {
        Resolution::Pending => "node ...".to_string(),
        Resolution::Ready(info) => format!("hardfork {}", info.hard_fork),
        Resolution::Unavailable(reason) => format!("node unavailable ({reason})"),
    };

    let fork = match (&view.fork_origin, view.fork_chain_name()) {
        (Resolution::Ready(ForkOrigin::ChainId(id)), Some(name)) => {
            format!("forked from {name} ({id})")
        }
        (Resolution::Ready(_), _) => "not forked".to_string(),
        (Resolution::Pending, _) => "fork ...".to_string(),
        (Resolution::Unavailable(reason), _) => format!("fork unavailable ({reason})"),
    };

    format!("{} | {block} | {tx} | {node} | {fork}", view.identity)
}
