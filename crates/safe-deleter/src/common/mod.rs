use std::path::PathBuf;

use alloy_primitives::{Address, B256};
use clap::{value_parser, Parser};
use safe_multisig::{
    consts::urls::DEFAULT_TRANSACTION_SERVICE_ROOT, normalize_address, ChainKey, ChainRegistry,
    JsonFileStore, LocalWallet, ReqwestTransport, RetryPolicy, SafeClient,
};

use consts::{API_ROOT_ENV, DEFAULT_ROOT_DIR, FAVORITES_FILE, LABELS_FILE, PRIVATE_KEY_ENV};

pub mod consts;

pub fn parse_chain_key(value: &str) -> Result<ChainKey, String> {
    ChainKey::from_key(value).map_err(|e| e.to_string())
}

pub fn parse_address(value: &str) -> Result<Address, String> {
    normalize_address(value).map_err(|e| e.to_string())
}

pub fn parse_safe_tx_hash(value: &str) -> Result<B256, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid Safe transaction hash: {}", value))
}

#[derive(Debug, Parser, Clone)]
pub struct DatadirCliArgs {
    #[arg(
        long,
        required = false,
        value_parser = value_parser!(PathBuf),
        help = "Directory holding favorites and labels. \
                    Defaults to home_dir/.safe-deleter if the home dir is available, otherwise it defaults to `.`"
    )]
    data_dir: Option<PathBuf>,
}

impl DatadirCliArgs {
    pub fn get_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(DEFAULT_ROOT_DIR))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    pub fn favorites_store(&self) -> JsonFileStore {
        JsonFileStore::open(self.get_data_dir().join(FAVORITES_FILE))
    }

    pub fn labels_store(&self) -> JsonFileStore {
        JsonFileStore::open(self.get_data_dir().join(LABELS_FILE))
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ServiceCliArgs {
    #[arg(
        long,
        env = API_ROOT_ENV,
        value_name = "URL",
        default_value = DEFAULT_TRANSACTION_SERVICE_ROOT,
        help = "Root of the Safe transaction service. Chain paths are appended to it."
    )]
    api_root: String,

    #[arg(
        long,
        value_name = "N",
        help = "Stop after N rate limited attempts. Retries every 3s without limit by default."
    )]
    max_attempts: Option<u32>,
}

impl ServiceCliArgs {
    pub fn registry(&self) -> ChainRegistry {
        ChainRegistry::new(&self.api_root)
    }

    pub fn client(&self) -> SafeClient<ReqwestTransport> {
        let policy = match self.max_attempts {
            Some(max_attempts) => RetryPolicy::rate_limit().with_max_attempts(max_attempts),
            None => RetryPolicy::rate_limit(),
        };
        SafeClient::from_registry(self.registry()).with_retry_policy(policy)
    }
}

#[derive(Debug, Parser, Clone)]
pub struct WalletCliArgs {
    #[arg(
        long,
        env = PRIVATE_KEY_ENV,
        hide_env_values = true,
        value_name = "HEX",
        conflicts_with = "keystore",
        help = "Private key of the proposer."
    )]
    private_key: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        value_parser = value_parser!(PathBuf),
        help = "Encrypted JSON keystore of the proposer. The password is prompted for."
    )]
    keystore: Option<PathBuf>,
}

impl WalletCliArgs {
    /// The configured wallet, `None` when neither a key nor a keystore was given.
    pub fn wallet(&self) -> eyre::Result<Option<LocalWallet>> {
        if let Some(private_key) = &self.private_key {
            return Ok(Some(LocalWallet::from_private_key(private_key)?));
        }

        if let Some(keystore) = &self.keystore {
            let password = rpassword::prompt_password_stdout("\nEnter keystore password: ")?;
            return Ok(Some(LocalWallet::from_keystore(keystore, &password)?));
        }

        Ok(None)
    }
}

#[derive(Debug, Parser, Clone)]
pub struct SafeCliArgs {
    #[arg(value_name = "CHAIN", value_parser = parse_chain_key, help = "Chain key, e.g. eth, gno, arb1.")]
    pub chain: ChainKey,

    #[arg(value_name = "SAFE", value_parser = parse_address, help = "The Safe address.")]
    pub safe: Address,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn value_parsers() {
        assert_eq!(parse_chain_key("GNO"), Ok(ChainKey::Gno));
        assert_eq!(parse_chain_key("sepolia"), Err("Unsupported chain: sepolia".to_string()));

        assert!(parse_address("0x000000000000000000000000000000000000dead").is_ok());
        assert!(parse_address("0xdead").is_err());

        assert_eq!(parse_safe_tx_hash(&format!("0x{}", "ab".repeat(32))), Ok(B256::repeat_byte(0xab)));
        assert!(parse_safe_tx_hash("0x1234").is_err());
    }

    #[test]
    fn data_dir_defaults_to_home() {
        let args = DatadirCliArgs { data_dir: None };
        if let Some(home) = dirs::home_dir() {
            assert_eq!(args.get_data_dir(), home.join(DEFAULT_ROOT_DIR));
        }

        let dir = tempfile::tempdir().unwrap();
        let args = DatadirCliArgs { data_dir: Some(dir.path().to_path_buf()) };
        assert_eq!(args.favorites_store().path(), dir.path().join(FAVORITES_FILE));
        assert_eq!(args.labels_store().path(), dir.path().join(LABELS_FILE));
    }

    #[test]
    fn wallet_is_optional() {
        let args = WalletCliArgs { private_key: None, keystore: None };
        assert!(args.wallet().unwrap().is_none());

        let args = WalletCliArgs {
            private_key: Some("0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcab78d7690ff80f".into()),
            keystore: None,
        };
        assert!(args.wallet().unwrap().is_some());
    }
}
