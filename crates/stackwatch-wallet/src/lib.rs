//! stackwatch-wallet: talk to wallet providers about stacks.
//!
//! # Architecture
//!
//! ```text
//! DiscoveryBus ──announce/retract──▶ ProviderRegistry ──▶ ProviderRecord
//!                                                            │
//!                     ChainRegistrar::add_chain ─────────────┘
//!                       └── wallet_addEthereumChain → Result<(), WalletError>
//! ```
//!
//! The registry is an explicit service owned by the application's
//! composition root (`init` / `dispose`), never ambient global state.

pub mod discovery;
pub mod error;
pub mod notice;
pub mod provider;
pub mod registration;
pub mod registry;
pub mod rpc_provider;

pub use discovery::{DiscoveryBus, DiscoveryEvent, StaticDiscovery};
pub use error::{WalletError, USER_REJECTED_CODE};
pub use notice::Notice;
pub use provider::{ProviderRecord, WalletProvider};
pub use registration::{AddChainParams, ChainRegistrar};
pub use registry::{ProviderRegistry, Subscription};
pub use rpc_provider::RpcWalletProvider;
