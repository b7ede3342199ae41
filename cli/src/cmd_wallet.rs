//! `wallets` and `add-chain`: the composition root for the provider registry.
//!
//! Wallets are reached through their local JSON-RPC endpoints and announced to
//! the registry by a static discovery bus.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use stackwatch_core::StackRecord;
use stackwatch_http::{HttpClientConfig, HttpRpcClient};
use stackwatch_wallet::{
    AddChainParams, ChainRegistrar, Notice, ProviderRecord, ProviderRegistry, RpcWalletProvider,
    StaticDiscovery, WalletProvider,
};
use stackwatch_ws::{WsClientConfig, WsRpcClient};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::WalletEndpoint;

/// Configured wallets, plus one given on the command line.
pub fn endpoints(
    configured: &[WalletEndpoint],
    name: Option<&str>,
    url: Option<&str>,
) -> Vec<WalletEndpoint> {
    let mut all = configured.to_vec();
    if let Some(url) = url {
        all.retain(|w| w.url != url);
        all.push(WalletEndpoint {
            name: name.unwrap_or("wallet").to_string(),
            url: url.to_string(),
            rdns: String::new(),
        });
    }
    all
}

/// Wallet requests wait on the user, so neither transport may time out or
/// re-send them.
fn provider(endpoint: &WalletEndpoint) -> Result<ProviderRecord> {
    let handle: Arc<dyn WalletProvider> =
        if endpoint.url.starts_with("ws://") || endpoint.url.starts_with("wss://") {
            Arc::new(RpcWalletProvider::new(WsRpcClient::connect(
                endpoint.url.clone(),
                WsClientConfig::default(),
            )))
        } else {
            Arc::new(RpcWalletProvider::new(HttpRpcClient::new(
                endpoint.url.clone(),
                HttpClientConfig::interactive(),
            )?))
        };
    Ok(ProviderRecord::new(format!("rpc:{}", endpoint.url), endpoint.name.clone(), handle)
        .with_rdns(endpoint.rdns.clone()))
}

/// Start a registry over `endpoints` and wait until all are announced.
async fn discover(endpoints: &[WalletEndpoint]) -> Result<ProviderRegistry> {
    let records = endpoints.iter().map(provider).collect::<Result<Vec<_>>>()?;
    let expected = records.len();

    let registry = ProviderRegistry::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _sub = registry.subscribe(move |list| {
        let _ = tx.send(list.len());
    });
    registry.init(Arc::new(StaticDiscovery::new(records)));

    if expected > 0 {
        let announced = tokio::time::timeout(Duration::from_secs(2), async {
            while let Some(n) = rx.recv().await {
                if n >= expected {
                    break;
                }
            }
        })
        .await;
        if announced.is_err() {
            debug!(expected, found = registry.list_providers().len(), "discovery timed out");
        }
    }
    Ok(registry)
}

pub async fn list(endpoints: &[WalletEndpoint]) -> Result<()> {
    let registry = discover(endpoints).await?;
    let providers = registry.list_providers();
    if providers.is_empty() {
        println!("No wallets configured.");
    }
    for p in &providers {
        println!("{:<16} {}", p.name, p.uuid);
    }
    registry.dispose();
    Ok(())
}

pub async fn add_chain(
    stack: &StackRecord,
    endpoints: &[WalletEndpoint],
    wallet: Option<&str>,
) -> Result<()> {
    let registry = discover(endpoints).await?;
    let providers = registry.list_providers();

    let chosen = match wallet {
        Some(name) => providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| anyhow!("no wallet named '{name}'")),
        None => providers
            .first()
            .ok_or_else(|| anyhow!("no wallets configured; pass --wallet-url or add `wallets` to the config")),
    };
    let chosen = match chosen {
        Ok(p) => p.clone(),
        Err(e) => {
            registry.dispose();
            return Err(e);
        }
    };

    let params = AddChainParams::from_stack(stack);
    let result = ChainRegistrar::new().add_chain(&chosen, &params).await;
    registry.dispose();

    match Notice::for_outcome(&chosen.name, &result) {
        Some(Notice::Success(message)) => println!("{message}"),
        Some(Notice::Error(message)) => bail!(message),
        None => {}
    }
    Ok(())
}
