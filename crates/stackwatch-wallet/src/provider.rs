//! The provider contract (EIP-1193 `request`) and discovered provider records.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// A wallet that accepts EIP-1193 style requests.
///
/// The error side is whatever the wallet threw, unparsed. Wallets disagree on
/// its shape, so it is only interpreted at one place:
/// [`WalletError::classify`](crate::WalletError::classify).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> Result<Value, Value>;
}

/// One announced provider (EIP-6963 `info` plus the request handle).
#[derive(Clone)]
pub struct ProviderRecord {
    pub uuid: String,
    pub name: String,
    /// Data URI of the wallet icon.
    pub icon: String,
    /// Reverse-DNS id, e.g. `"dev.ethui"`.
    pub rdns: String,
    pub handle: Arc<dyn WalletProvider>,
}

impl ProviderRecord {
    pub fn new(
        uuid: impl Into<String>,
        name: impl Into<String>,
        handle: Arc<dyn WalletProvider>,
    ) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            icon: String::new(),
            rdns: String::new(),
            handle,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn with_rdns(mut self, rdns: impl Into<String>) -> Self {
        self.rdns = rdns.into();
        self
    }
}

impl fmt::Debug for ProviderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRecord")
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("rdns", &self.rdns)
            .finish_non_exhaustive()
    }
}
