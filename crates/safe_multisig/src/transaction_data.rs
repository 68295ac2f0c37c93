use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::deserialize_u64_lenient;

/// A multisig transaction proposed to the transaction service and not yet executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedTransaction {
    pub safe_tx_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub nonce: u64,
    #[serde(default)]
    pub submission_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proposer: Option<Address>,
    /// Takes precedence over `proposer` when set.
    #[serde(default)]
    pub proposed_by_delegate: Option<Address>,
    #[serde(default)]
    pub is_executed: bool,
    #[serde(default)]
    pub executor: Option<Address>,
    #[serde(default)]
    pub execution_date: Option<DateTime<Utc>>,
}

impl QueuedTransaction {
    /// The address entitled to delete this transaction, if known.
    pub fn effective_proposer(&self) -> Option<Address> {
        self.proposed_by_delegate.or(self.proposer)
    }

    /// Whether the service reports any sign of execution.
    pub fn shows_execution(&self) -> bool {
        self.is_executed || self.executor.is_some() || self.execution_date.is_some()
    }
}

/// One page of the multisig transaction listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<QueuedTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSafes {
    #[serde(default)]
    pub safes: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeInfo {
    #[serde(deserialize_with = "deserialize_u64_lenient")]
    pub nonce: u64,
}

/// Body of `DELETE /api/v2/multisig-transactions/{safeTxHash}/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteTransactionBody {
    pub signature: Bytes,
    pub totp: u64,
}
