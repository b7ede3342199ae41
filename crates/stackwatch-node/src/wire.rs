//! Raw shapes as anvil serializes them, and their validation into
//! [`crate::types`].
//!
//! anvil is not consistent about quantities: some are hex strings, some
//! decimal strings, some JSON numbers. [`Quantity`] accepts all three and
//! rejects anything else.

use serde::Deserialize;
use stackwatch_core::TxHash;

use crate::types::{ForkConfig, NodeEnvironment, NodeIntrospection, TxOutcome};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    pub(crate) fn to_u128(&self, field: &str) -> Result<u128, String> {
        match self {
            Self::Number(n) => Ok(u128::from(*n)),
            Self::Text(s) => {
                let parsed = match s.strip_prefix("0x") {
                    Some(hex) => u128::from_str_radix(hex, 16),
                    None => s.parse::<u128>(),
                };
                parsed.map_err(|_| format!("{field}: invalid quantity {s:?}"))
            }
        }
    }

    pub(crate) fn to_u64(&self, field: &str) -> Result<u64, String> {
        let v = self.to_u128(field)?;
        u64::try_from(v).map_err(|_| format!("{field}: {v} out of range"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeInfoWire {
    current_block_number: Quantity,
    current_block_timestamp: Quantity,
    current_block_hash: TxHash,
    hard_fork: String,
    transaction_order: String,
    environment: EnvironmentWire,
    #[serde(default)]
    fork_config: Option<ForkConfigWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvironmentWire {
    base_fee: Quantity,
    chain_id: Quantity,
    gas_limit: Quantity,
    gas_price: Quantity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForkConfigWire {
    #[serde(default)]
    fork_url: Option<String>,
    #[serde(default)]
    fork_block_number: Option<Quantity>,
    #[serde(default)]
    fork_retry_backoff: Option<Quantity>,
}

impl TryFrom<NodeInfoWire> for NodeIntrospection {
    type Error = String;

    fn try_from(w: NodeInfoWire) -> Result<Self, Self::Error> {
        let env = w.environment;
        let environment = NodeEnvironment {
            base_fee: env.base_fee.to_u128("environment.baseFee")?,
            chain_id: env.chain_id.to_u64("environment.chainId")?,
            gas_limit: env.gas_limit.to_u128("environment.gasLimit")?,
            gas_price: env.gas_price.to_u128("environment.gasPrice")?,
        };

        // Non-forked nodes report either `null` or an object with a null URL.
        let fork_config = match w.fork_config {
            Some(ForkConfigWire {
                fork_url: Some(fork_url),
                fork_block_number,
                fork_retry_backoff,
            }) if !fork_url.is_empty() => {
                let fork_block_number = fork_block_number
                    .ok_or("forkConfig.forkBlockNumber: missing")?
                    .to_u64("forkConfig.forkBlockNumber")?;
                let fork_retry_backoff = fork_retry_backoff
                    .map(|q| q.to_u64("forkConfig.forkRetryBackoff"))
                    .transpose()?;
                Some(ForkConfig {
                    fork_url,
                    fork_block_number,
                    fork_retry_backoff,
                })
            }
            _ => None,
        };

        Ok(Self {
            current_block_number: w.current_block_number.to_u64("currentBlockNumber")?,
            current_block_timestamp: w.current_block_timestamp.to_u64("currentBlockTimestamp")?,
            current_block_hash: w.current_block_hash,
            hard_fork: w.hard_fork,
            transaction_order: w.transaction_order,
            environment,
            fork_config,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReceiptWire {
    transaction_hash: TxHash,
    #[serde(default)]
    status: Option<Quantity>,
}

impl ReceiptWire {
    pub(crate) fn into_outcome(self, requested: TxHash) -> Result<TxOutcome, String> {
        if self.transaction_hash != requested {
            return Err(format!(
                "receipt is for {} not {requested}",
                self.transaction_hash
            ));
        }
        let status = self.status.ok_or("status: missing")?.to_u64("status")?;
        match status {
            0 | 1 => Ok(TxOutcome {
                hash: requested,
                success: status == 1,
            }),
            other => Err(format!("status: unexpected value {other}")),
        }
    }
}
