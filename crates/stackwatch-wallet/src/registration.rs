//! `wallet_addEthereumChain`: ask a wallet to add a stack as a custom network.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use stackwatch_core::hex;
use stackwatch_core::StackRecord;
use tracing::{debug, info, warn};

use crate::error::WalletError;
use crate::provider::ProviderRecord;

pub const ADD_CHAIN_METHOD: &str = "wallet_addEthereumChain";

/// What a wallet needs to know to add a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddChainParams {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_url: String,
    pub ws_url: String,
    pub explorer_url: String,
}

impl AddChainParams {
    /// Params for a stack, named after its slug.
    pub fn from_stack(stack: &StackRecord) -> Self {
        Self {
            chain_id: stack.chain_id,
            chain_name: stack.slug.clone(),
            rpc_url: stack.rpc_url.clone(),
            ws_url: stack.ws_rpc.clone(),
            explorer_url: stack.explorer_url.clone(),
        }
    }

    /// The `params` array sent with `wallet_addEthereumChain`.
    pub fn to_request(&self) -> Value {
        json!([{
            "chainId": hex::quantity(self.chain_id),
            "chainName": self.chain_name,
            "rpcUrls": [self.rpc_url],
            "wsUrls": [self.ws_url],
            "blockExplorerUrls": [self.explorer_url],
            "nativeCurrency": {
                "name": "Ether",
                "symbol": "ETH",
                "decimals": 18,
            },
        }])
    }
}

/// Sends chain registrations, at most one in flight per provider.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistrar {
    pending: Arc<Mutex<HashSet<String>>>,
}

impl ChainRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask `provider` to add the network described by `params`.
    ///
    /// Waits as long as the wallet takes; the user may sit on the prompt
    /// indefinitely. A second call for the same provider while one is
    /// outstanding fails fast with [`WalletError::RequestPending`].
    pub async fn add_chain(
        &self,
        provider: &ProviderRecord,
        params: &AddChainParams,
    ) -> Result<(), WalletError> {
        let Some(_guard) = PendingGuard::acquire(&self.pending, &provider.uuid) else {
            debug!(provider = %provider.name, "add chain already pending; ignoring");
            return Err(WalletError::RequestPending {
                wallet: provider.name.clone(),
            });
        };

        debug!(
            provider = %provider.name,
            chain_id = params.chain_id,
            network = %params.chain_name,
            "requesting wallet_addEthereumChain"
        );

        match provider
            .handle
            .request(ADD_CHAIN_METHOD, params.to_request())
            .await
        {
            Ok(_) => {
                info!(provider = %provider.name, network = %params.chain_name, "chain added to wallet");
                Ok(())
            }
            Err(fault) => {
                let err = WalletError::classify(&fault, &params.chain_name);
                if err.is_user_rejection() {
                    debug!(provider = %provider.name, "user rejected add chain");
                } else {
                    warn!(provider = %provider.name, error = %err, raw = %fault, "add chain failed");
                }
                Err(err)
            }
        }
    }

    pub fn is_pending(&self, uuid: &str) -> bool {
        self.pending.lock().unwrap().contains(uuid)
    }

    /// Uuids of providers with a registration waiting on the user.
    pub fn pending_providers(&self) -> Vec<String> {
        let mut uuids: Vec<String> = self.pending.lock().unwrap().iter().cloned().collect();
        uuids.sort();
        uuids
    }
}

/// Marks a provider busy; released on drop, including when the future is dropped.
struct PendingGuard {
    set: Arc<Mutex<HashSet<String>>>,
    uuid: String,
}

impl PendingGuard {
    fn acquire(set: &Arc<Mutex<HashSet<String>>>, uuid: &str) -> Option<Self> {
        if !set.lock().unwrap().insert(uuid.to_string()) {
            return None;
        }
        Some(Self {
            set: Arc::clone(set),
            uuid: uuid.to_string(),
        })
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.uuid);
    }
}
