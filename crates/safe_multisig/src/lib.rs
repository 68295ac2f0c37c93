//! Client and state machines for cancelling queued Safe multisig transactions
//! through the Safe transaction service.

pub mod chains;
pub mod client;
pub mod consts;
pub mod deletion;
pub mod error;
pub mod http;
pub mod notice;
pub mod owners;
pub mod queue;
pub mod store;
pub mod transaction_data;
pub mod typed_data;
pub mod utils;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use chains::{ChainDescriptor, ChainKey, ChainRegistry};
pub use client::SafeClient;
pub use deletion::{
    Clock, DeletionAttempt, DeletionAuthorizer, DeletionFailure, DeletionOutcome, DeletionState,
    PendingConfirmation, SystemClock,
};
pub use error::{SafeApiError, StoreError, TransportError, WalletError};
pub use http::{HttpClient, HttpTransport, ReqwestTransport, RetryPolicy};
pub use notice::{Notice, NoticeLevel};
pub use owners::{fetch_all_owner_safes, OwnerSafesSummary};
pub use queue::{Eligibility, LoadOutcome, QueueReconciler};
pub use store::{FavoriteSafe, Favorites, JsonFileStore, KeyValueStore, MemoryStore, SafeLabels};
pub use transaction_data::{QueuedTransaction, TransactionPage};
pub use typed_data::DeleteRequestTypedData;
pub use utils::{authorization_token, normalize_address};
pub use wallet::{LocalWallet, WalletCapabilities};
