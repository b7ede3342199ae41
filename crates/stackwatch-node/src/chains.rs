//! Display names for chain ids a stack is commonly forked from.

/// `(chain id, name)` pairs, sorted by id.
const KNOWN_CHAINS: &[(u64, &str)] = &[
    (1, "Ethereum"),
    (10, "OP Mainnet"),
    (56, "BNB Smart Chain"),
    (100, "Gnosis"),
    (137, "Polygon"),
    (250, "Fantom"),
    (324, "ZKsync Era"),
    (1101, "Polygon zkEVM"),
    (5000, "Mantle"),
    (8453, "Base"),
    (17000, "Holesky"),
    (31337, "Anvil"),
    (34443, "Mode Mainnet"),
    (42161, "Arbitrum One"),
    (42170, "Arbitrum Nova"),
    (42220, "Celo"),
    (43114, "Avalanche"),
    (59144, "Linea Mainnet"),
    (81457, "Blast"),
    (84532, "Base Sepolia"),
    (421614, "Arbitrum Sepolia"),
    (534352, "Scroll"),
    (560048, "Hoodi"),
    (7777777, "Zora"),
    (11155111, "Sepolia"),
    (11155420, "OP Sepolia"),
];

/// Human-readable name for `chain_id`, falling back to `"Chain <id>"`.
pub fn chain_name(chain_id: u64) -> String {
    match KNOWN_CHAINS.binary_search_by_key(&chain_id, |(id, _)| *id) {
        Ok(i) => KNOWN_CHAINS[i].1.to_string(),
        Err(_) => format!("Chain {chain_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted() {
        assert!(KNOWN_CHAINS.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn known_and_unknown_ids() {
        assert_eq!(chain_name(1), "Ethereum");
        assert_eq!(chain_name(42161), "Arbitrum One");
        assert_eq!(chain_name(987654), "Chain 987654");
    }
}
