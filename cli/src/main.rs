//! stackwatch CLI: live state of anvil dev stacks.
//!
//! # Commands
//! ```text
//! stackwatch watch        [--json]
//! stackwatch node-info    [--json]
//! stackwatch chain-id     [--url <rpc>]
//! stackwatch fork-origin
//! stackwatch wallets
//! stackwatch add-chain    [--wallet <name>] [--wallet-url <url>]
//! ```

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd_node;
mod cmd_wallet;
mod cmd_watch;
mod config;
mod logging;

use config::{StackArgs, StackwatchConfig};

#[derive(Parser)]
#[command(
    name = "stackwatch",
    about = "Watch anvil dev stacks and register them with wallets",
    long_about = "
stackwatch: follow the chain head of an anvil stack, inspect its node,
resolve the network it was forked from, and add it to a wallet.

Without stack flags or a config file, commands target a local anvil at
http://127.0.0.1:8545.

ENVIRONMENT VARIABLES:
  STACKWATCH_CONFIG      Path to stackwatch.yaml
  STACKWATCH_RPC_URL     HTTP JSON-RPC URL of the stack
  STACKWATCH_WS_URL      WebSocket JSON-RPC URL of the stack
  STACKWATCH_FORK_URL    Upstream RPC the stack was forked from
  STACKWATCH_WALLET_URL  JSON-RPC endpoint of a wallet (add-chain)
  RUST_LOG               Overrides every configured log directive
",
    version
)]
struct Cli {
    /// YAML config file
    #[arg(long, global = true, env = "STACKWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Global log level (overrides the config file)
    #[arg(long, global = true, env = "STACKWATCH_LOG")]
    log_level: Option<String>,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    stack: StackArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the live view of a stack until Ctrl-C
    Watch {
        /// Print each view as a JSON line
        #[arg(long)]
        json: bool,
        /// Re-pull node info every N milliseconds
        #[arg(long)]
        refresh_ms: Option<u64>,
    },

    /// Show anvil_nodeInfo of the stack
    #[command(name = "node-info")]
    NodeInfo {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Query eth_chainId of an endpoint (default: the stack)
    #[command(name = "chain-id")]
    ChainId {
        #[arg(long)]
        url: Option<String>,
    },

    /// Resolve which network the stack was forked from
    #[command(name = "fork-origin")]
    ForkOrigin,

    /// List reachable wallets
    Wallets,

    /// Ask a wallet to add the stack as a custom network
    #[command(name = "add-chain")]
    AddChain {
        /// Wallet name, as configured (default: the first wallet)
        #[arg(long)]
        wallet: Option<String>,
        /// JSON-RPC endpoint of a wallet not in the config file
        #[arg(long, env = "STACKWATCH_WALLET_URL")]
        wallet_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => StackwatchConfig::load(path)?,
        None => StackwatchConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }
    if cli.json_logs {
        config.log.json = true;
    }
    logging::init_tracing(&config.log);

    let stack = cli.stack.resolve(config.stack.as_ref());

    match cli.command {
        Commands::Watch { json, refresh_ms } => {
            let mut live = config.live.clone();
            if refresh_ms.is_some() {
                live.introspection_refresh_ms = refresh_ms;
            }
            cmd_watch::run(&stack, live.to_live_config(), json).await
        }

        Commands::NodeInfo { json } => cmd_node::node_info(&stack, json).await,

        Commands::ChainId { url } => {
            cmd_node::chain_id(url.as_deref().unwrap_or(&stack.rpc_url)).await
        }

        Commands::ForkOrigin => cmd_node::fork_origin(&stack).await,

        Commands::Wallets => {
            let endpoints = cmd_wallet::endpoints(&config.wallets, None, None);
            cmd_wallet::list(&endpoints).await
        }

        Commands::AddChain { wallet, wallet_url } => {
            let endpoints =
                cmd_wallet::endpoints(&config.wallets, wallet.as_deref(), wallet_url.as_deref());
            cmd_wallet::add_chain(&stack, &endpoints, wallet.as_deref()).await
        }
    }
}
