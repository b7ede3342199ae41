//! `stackwatch.yaml`: optional config file, overridden by flags and env vars.
//!
//! ```yaml
//! log:
//!   level: info
//!   components:
//!     stackwatch-live: debug
//! live:
//!   introspection_refresh_ms: 10000
//! stack:
//!   slug: alice
//!   status: running
//!   chain_id: 31337
//!   rpc_url: https://alice.stacks.example/
//!   ws_rpc: wss://alice.stacks.example/
//!   explorer_url: https://explorer.stacks.example/alice
//!   inserted_at: 1718000000
//!   updated_at: 1718000000
//! wallets:
//!   - name: ethui
//!     url: http://127.0.0.1:9002
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use stackwatch_core::policy::RetryConfig;
use stackwatch_core::{AnvilOpts, StackRecord, StackStatus};
use stackwatch_live::LiveConfig;

use crate::logging::LogConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackwatchConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub live: LiveSettings,
    /// Stack to target when no stack flags are given.
    #[serde(default)]
    pub stack: Option<StackRecord>,
    /// Wallets reachable over JSON-RPC, for `add-chain`.
    #[serde(default)]
    pub wallets: Vec<WalletEndpoint>,
}

impl StackwatchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
    }
}

/// Serializable form of [`LiveConfig`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSettings {
    /// Re-pull node info every N milliseconds (unset: pull once)
    #[serde(default)]
    pub introspection_refresh_ms: Option<u64>,
    #[serde(default = "default_receipt_retries")]
    pub receipt_max_retries: u32,
    #[serde(default = "default_receipt_backoff_ms")]
    pub receipt_backoff_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_receipt_retries() -> u32 { 5 }
fn default_receipt_backoff_ms() -> u64 { 250 }
fn default_channel_capacity() -> usize { 256 }

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            introspection_refresh_ms: None,
            receipt_max_retries: default_receipt_retries(),
            receipt_backoff_ms: default_receipt_backoff_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl LiveSettings {
    pub fn to_live_config(&self) -> LiveConfig {
        let defaults = LiveConfig::default();
        LiveConfig {
            introspection_refresh: self.introspection_refresh_ms.map(Duration::from_millis),
            receipt_retry: RetryConfig {
                max_retries: self.receipt_max_retries,
                initial_backoff: Duration::from_millis(self.receipt_backoff_ms),
                ..defaults.receipt_retry
            },
            channel_capacity: self.channel_capacity,
            ..defaults
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEndpoint {
    pub name: String,
    /// `http(s)://` or `ws(s)://` JSON-RPC endpoint of the wallet.
    pub url: String,
    #[serde(default)]
    pub rdns: String,
}

/// Flag/env overrides for the targeted stack.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StackArgs {
    /// Stack slug
    #[arg(long, global = true, env = "STACKWATCH_SLUG")]
    pub slug: Option<String>,
    /// Stack chain id
    #[arg(long, global = true, env = "STACKWATCH_CHAIN_ID")]
    pub chain_id: Option<u64>,
    /// HTTP JSON-RPC URL of the stack
    #[arg(long, global = true, env = "STACKWATCH_RPC_URL")]
    pub rpc_url: Option<String>,
    /// WebSocket JSON-RPC URL of the stack
    #[arg(long, global = true, env = "STACKWATCH_WS_URL")]
    pub ws_url: Option<String>,
    /// Block explorer URL of the stack
    #[arg(long, global = true, env = "STACKWATCH_EXPLORER_URL")]
    pub explorer_url: Option<String>,
    /// Upstream RPC the stack was forked from
    #[arg(long, global = true, env = "STACKWATCH_FORK_URL")]
    pub fork_url: Option<String>,
}

/// A local anvil on its default port.
fn local_anvil() -> StackRecord {
    StackRecord {
        slug: "local".into(),
        status: StackStatus::Running,
        chain_id: 31337,
        rpc_url: "http://127.0.0.1:8545".into(),
        ws_rpc: "ws://127.0.0.1:8545".into(),
        explorer_url: String::new(),
        anvil_opts: None,
        graph_url: None,
        inserted_at: 0,
        updated_at: 0,
    }
}

impl StackArgs {
    /// The configured stack (or a local anvil) with flags applied on top.
    pub fn resolve(&self, configured: Option<&StackRecord>) -> StackRecord {
        let mut stack = configured.cloned().unwrap_or_else(local_anvil);
        if let Some(slug) = &self.slug {
            stack.slug = slug.clone();
        }
        if let Some(chain_id) = self.chain_id {
            stack.chain_id = chain_id;
        }
        if let Some(url) = &self.rpc_url {
            stack.rpc_url = url.clone();
        }
        if let Some(url) = &self.ws_url {
            stack.ws_rpc = url.clone();
        }
        if let Some(url) = &self.explorer_url {
            stack.explorer_url = url.clone();
        }
        if let Some(url) = &self.fork_url {
            stack.anvil_opts.get_or_insert_with(AnvilOpts::default).fork_url = Some(url.clone());
        }
        stack
    }
}
