use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{
    consts::urls::{DEFAULT_TRANSACTION_SERVICE_ROOT, SAFE_APP_URL},
    error::{Result, SafeApiError},
};

/// Short code identifying a chain served by the transaction service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChainKey {
    Eth,
    Pol,
    Arb1,
    Oeth,
    Base,
    Gno,
    Bnb,
    Avax,
}

impl ChainKey {
    /// Parses a chain key, failing with a configuration error for unknown keys.
    pub fn from_key(key: &str) -> Result<Self> {
        key.trim()
            .to_lowercase()
            .parse()
            .map_err(|_| SafeApiError::UnsupportedChain(key.to_string()))
    }

    fn entry(&self) -> &'static ChainEntry {
        match self {
            ChainKey::Eth => &CHAIN_TABLE[0],
            ChainKey::Pol => &CHAIN_TABLE[1],
            ChainKey::Arb1 => &CHAIN_TABLE[2],
            ChainKey::Oeth => &CHAIN_TABLE[3],
            ChainKey::Base => &CHAIN_TABLE[4],
            ChainKey::Gno => &CHAIN_TABLE[5],
            ChainKey::Bnb => &CHAIN_TABLE[6],
            ChainKey::Avax => &CHAIN_TABLE[7],
        }
    }
}

struct ChainEntry {
    chain_id: u64,
    display_name: &'static str,
    short_name: &'static str,
    explorer_base_url: &'static str,
    app_chain_key: &'static str,
}

const CHAIN_TABLE: [ChainEntry; 8] = [
    ChainEntry {
        chain_id: 1,
        display_name: "Ethereum",
        short_name: "ETH",
        explorer_base_url: "https://etherscan.io",
        app_chain_key: "eth",
    },
    ChainEntry {
        chain_id: 137,
        display_name: "Polygon",
        short_name: "POL",
        explorer_base_url: "https://polygonscan.com",
        app_chain_key: "matic",
    },
    ChainEntry {
        chain_id: 42161,
        display_name: "Arbitrum",
        short_name: "ARB",
        explorer_base_url: "https://arbiscan.io",
        app_chain_key: "arb1",
    },
    ChainEntry {
        chain_id: 10,
        display_name: "Optimism",
        short_name: "OP",
        explorer_base_url: "https://optimistic.etherscan.io",
        app_chain_key: "oeth",
    },
    ChainEntry {
        chain_id: 8453,
        display_name: "Base",
        short_name: "BASE",
        explorer_base_url: "https://basescan.org",
        app_chain_key: "base",
    },
    ChainEntry {
        chain_id: 100,
        display_name: "Gnosis",
        short_name: "GNO",
        explorer_base_url: "https://gnosisscan.io",
        app_chain_key: "gno",
    },
    ChainEntry {
        chain_id: 56,
        display_name: "BNB Chain",
        short_name: "BNB",
        explorer_base_url: "https://bscscan.com",
        app_chain_key: "bnb",
    },
    ChainEntry {
        chain_id: 43114,
        display_name: "Avalanche",
        short_name: "AVAX",
        explorer_base_url: "https://snowtrace.io",
        app_chain_key: "avax",
    },
];

/// Everything needed to talk to, and link to, one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub key: ChainKey,
    pub chain_id: u64,
    pub display_name: &'static str,
    pub short_name: &'static str,
    pub explorer_base_url: &'static str,
    pub api_base_url: String,
    pub app_base_url: String,
    pub app_chain_key: &'static str,
}

impl ChainDescriptor {
    fn new(key: ChainKey, api_root: &str) -> Self {
        let entry = key.entry();
        Self {
            key,
            chain_id: entry.chain_id,
            display_name: entry.display_name,
            short_name: entry.short_name,
            explorer_base_url: entry.explorer_base_url,
            api_base_url: format!("{}/{}", api_root, key),
            app_base_url: SAFE_APP_URL.to_string(),
            app_chain_key: entry.app_chain_key,
        }
    }

    /// Link to the Safe web app queue for `safe`.
    pub fn queue_url(&self, safe: Address) -> String {
        format!(
            "{}/transactions/queue?safe={}:{}",
            self.app_base_url,
            self.app_chain_key,
            safe.to_checksum(None)
        )
    }

    /// Link to a single queued transaction in the Safe web app.
    pub fn queue_tx_url(&self, safe: Address, safe_tx_hash: B256) -> String {
        format!("{}&txHash={}", self.queue_url(safe), safe_tx_hash)
    }

    pub fn explorer_address_url(&self, address: Address) -> String {
        format!("{}/address/{}", self.explorer_base_url, address.to_checksum(None))
    }
}

/// Process-wide table of supported chains. Built once and never mutated.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TRANSACTION_SERVICE_ROOT)
    }
}

impl ChainRegistry {
    /// Registry of every known chain, with API base URLs rooted at `api_root`.
    pub fn new(api_root: &str) -> Self {
        Self::with_chains(api_root, ChainKey::iter())
    }

    pub fn with_chains(api_root: &str, keys: impl IntoIterator<Item = ChainKey>) -> Self {
        let api_root = api_root.trim_end_matches('/');
        let chains = keys.into_iter().map(|key| ChainDescriptor::new(key, api_root)).collect();

        Self { chains }
    }

    pub fn get(&self, key: ChainKey) -> Result<&ChainDescriptor> {
        self.chains
            .iter()
            .find(|chain| chain.key == key)
            .ok_or_else(|| SafeApiError::UnsupportedChain(key.to_string()))
    }

    pub fn by_chain_id(&self, chain_id: u64) -> Option<&ChainDescriptor> {
        self.chains.iter().find(|chain| chain.chain_id == chain_id)
    }

    pub fn api_base_url(&self, key: ChainKey) -> Result<&str> {
        Ok(self.get(key)?.api_base_url.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = ChainKey> + '_ {
        self.chains.iter().map(|chain| chain.key)
    }
}
