use std::path::Path;

use alloy_primitives::{hex::ToHexExt, Address, Bytes};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::{error::WalletError, typed_data::DeleteRequestTypedData};

/// What the deletion flow needs from a connected wallet.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait WalletCapabilities: Send + Sync {
    /// The connected account, `None` when disconnected.
    fn address(&self) -> Option<Address>;

    /// The chain the wallet is currently on.
    fn chain_id(&self) -> Option<u64>;

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Returns the 65 byte `r || s || v` signature over the EIP-712 payload.
    async fn sign_typed_data(&self, typed_data: &DeleteRequestTypedData) -> Result<Bytes, WalletError>;
}

/// Wallet backed by a local private key. Chain switches always succeed.
#[derive(Debug)]
pub struct LocalWallet {
    signer: PrivateKeySigner,
    chain_id: Mutex<Option<u64>>,
}

impl LocalWallet {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self {
            signer,
            chain_id: Mutex::new(None),
        }
    }

    pub fn from_private_key(private_key: &str) -> Result<Self, WalletError> {
        let signer: PrivateKeySigner = private_key
            .trim()
            .parse()
            .map_err(|e| WalletError::Other(format!("Invalid private key: {}", e)))?;

        Ok(Self::new(signer))
    }

    pub fn from_keystore(path: impl AsRef<Path>, password: &str) -> Result<Self, WalletError> {
        let signer = PrivateKeySigner::decrypt_keystore(path, password)
            .map_err(|e| WalletError::Other(format!("Failed to decrypt keystore: {}", e)))?;

        Ok(Self::new(signer))
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        *self.chain_id.lock() = Some(chain_id);
        self
    }
}

#[async_trait]
impl WalletCapabilities for LocalWallet {
    fn address(&self) -> Option<Address> {
        Some(self.signer.address())
    }

    fn chain_id(&self) -> Option<u64> {
        *self.chain_id.lock()
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        debug!(chain_id, "Switching local wallet chain");
        *self.chain_id.lock() = Some(chain_id);
        Ok(())
    }

    async fn sign_typed_data(&self, typed_data: &DeleteRequestTypedData) -> Result<Bytes, WalletError> {
        let hash = typed_data.signing_hash();
        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| WalletError::Other(e.to_string()))?;

        debug!(hash = %hash, signature = %signature.as_bytes().encode_hex_with_prefix(), "Signed delete request");
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}
