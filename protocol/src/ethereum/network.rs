//! Ethereum network descriptors.
//!
//! The chain id is folded into every signed pre-image (EIP-155), so the same
//! transaction fields produce different bytes on different networks. Every
//! encode/decode call therefore takes an explicit [`EthereumNetwork`];
//! there is deliberately no "current network" global.

use std::fmt;

use serde::Serialize;

use crate::config::{CHAIN_ID_MAINNET, CHAIN_ID_RINKEBY, CHAIN_ID_ROPSTEN};

/// Identity of an Ethereum-style network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EthereumNetwork {
    name: &'static str,
    chain_id: u64,
}

impl EthereumNetwork {
    pub const MAINNET: EthereumNetwork = EthereumNetwork::new("mainnet", CHAIN_ID_MAINNET);
    pub const ROPSTEN: EthereumNetwork = EthereumNetwork::new("ropsten", CHAIN_ID_ROPSTEN);
    pub const RINKEBY: EthereumNetwork = EthereumNetwork::new("rinkeby", CHAIN_ID_RINKEBY);

    /// Describe a network not in the built-in list (private chains, devnets).
    pub const fn new(name: &'static str, chain_id: u64) -> Self {
        Self { name, chain_id }
    }

    /// Look up a built-in network by chain id.
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        [Self::MAINNET, Self::ROPSTEN, Self::RINKEBY]
            .into_iter()
            .find(|network| network.chain_id == chain_id)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

impl fmt::Display for EthereumNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (chain id {})", self.name, self.chain_id)
    }
}
