use std::borrow::Cow;

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde_json::{json, Value};

use crate::consts::{DELETE_REQUEST_DOMAIN_NAME, DELETE_REQUEST_DOMAIN_VERSION};

sol! {
    /// Message the transaction service verifies before deleting a queued transaction.
    #[derive(Debug, PartialEq, Eq)]
    struct DeleteRequest {
        bytes32 safeTxHash;
        uint256 totp;
    }
}

/// Everything a wallet needs to sign a deletion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteRequestTypedData {
    pub chain_id: u64,
    /// The Safe is the verifying contract of the domain.
    pub safe: Address,
    pub safe_tx_hash: B256,
    pub totp: u64,
}

impl DeleteRequestTypedData {
    pub fn domain(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Borrowed(DELETE_REQUEST_DOMAIN_NAME)),
            Some(Cow::Borrowed(DELETE_REQUEST_DOMAIN_VERSION)),
            Some(U256::from(self.chain_id)),
            Some(self.safe),
            None,
        )
    }

    pub fn message(&self) -> DeleteRequest {
        DeleteRequest {
            safeTxHash: self.safe_tx_hash,
            totp: U256::from(self.totp),
        }
    }

    /// EIP-712 digest: `keccak256(0x1901 || domainSeparator || hashStruct(message))`.
    pub fn signing_hash(&self) -> B256 {
        self.message().eip712_signing_hash(&self.domain())
    }

    /// The `eth_signTypedData_v4` payload, for wallets that sign JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" },
                    { "name": "verifyingContract", "type": "address" },
                ],
                "DeleteRequest": [
                    { "name": "safeTxHash", "type": "bytes32" },
                    { "name": "totp", "type": "uint256" },
                ],
            },
            "primaryType": "DeleteRequest",
            "domain": {
                "name": DELETE_REQUEST_DOMAIN_NAME,
                "version": DELETE_REQUEST_DOMAIN_VERSION,
                "chainId": self.chain_id,
                "verifyingContract": self.safe.to_checksum(None),
            },
            "message": {
                "safeTxHash": self.safe_tx_hash.to_string(),
                "totp": self.totp,
            },
        })
    }
}
