use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    chains::ChainDescriptor,
    client::SafeClient,
    error::{SafeApiError, WalletError},
    http::HttpTransport,
    notice::Notice,
    queue::QueueReconciler,
    typed_data::DeleteRequestTypedData,
    utils::authorization_token,
    wallet::WalletCapabilities,
};

/// Source of the current time for the hourly authorization token.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Why a deletion attempt stopped. The display text is the user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeletionFailure {
    #[error("Connect a wallet to delete.")]
    WalletNotConnected,
    #[error("Please switch to {chain} to delete.")]
    SwitchChainRejected { chain: String },
    #[error("Signature request was rejected.")]
    SigningRejected,
    #[error("Signature invalid or not proposer.")]
    Unauthorized,
    #[error("Too many requests. Please wait a moment.")]
    RateLimited,
    #[error("Delete failed. Try again later.")]
    Failed,
}

impl DeletionFailure {
    /// Classifies a failed delete call. 404 is not a failure and is handled by the caller.
    fn from_api_error(err: &SafeApiError) -> Self {
        match err.status() {
            Some(401 | 403) => DeletionFailure::Unauthorized,
            Some(429) => DeletionFailure::RateLimited,
            _ => DeletionFailure::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    Deleted,
    /// The service no longer knows the transaction.
    AlreadyRemoved,
    Failed(DeletionFailure),
}

impl DeletionOutcome {
    /// Whether the transaction should leave the local queue.
    pub fn removes_transaction(&self) -> bool {
        matches!(self, DeletionOutcome::Deleted | DeletionOutcome::AlreadyRemoved)
    }

    pub fn notice(&self) -> Notice {
        match self {
            DeletionOutcome::Deleted => Notice::info("Transaction deleted."),
            DeletionOutcome::AlreadyRemoved => Notice::info("Transaction not found or already removed."),
            DeletionOutcome::Failed(failure) => Notice::error(failure.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionState {
    Idle,
    ChainCheck,
    Switching,
    Signing,
    Submitting { signature: Bytes, totp: u64 },
    Done(DeletionOutcome),
}

impl DeletionState {
    pub fn name(&self) -> &'static str {
        match self {
            DeletionState::Idle => "idle",
            DeletionState::ChainCheck => "chain_check",
            DeletionState::Switching => "switching",
            DeletionState::Signing => "signing",
            DeletionState::Submitting { .. } => "submitting",
            DeletionState::Done(_) => "done",
        }
    }
}

/// One deletion attempt for one transaction. Each state has its own transition.
pub struct DeletionAttempt<'a, T, C> {
    client: &'a SafeClient<T>,
    clock: &'a C,
    wallet: Option<&'a dyn WalletCapabilities>,
    chain: &'a ChainDescriptor,
    safe: Address,
    safe_tx_hash: B256,
}

impl<'a, T: HttpTransport, C: Clock> DeletionAttempt<'a, T, C> {
    pub fn new(
        client: &'a SafeClient<T>,
        clock: &'a C,
        wallet: Option<&'a dyn WalletCapabilities>,
        chain: &'a ChainDescriptor,
        safe: Address,
        safe_tx_hash: B256,
    ) -> Self {
        Self {
            client,
            clock,
            wallet,
            chain,
            safe,
            safe_tx_hash,
        }
    }

    fn wallet(&self) -> Result<&'a dyn WalletCapabilities, DeletionFailure> {
        self.wallet.ok_or(DeletionFailure::WalletNotConnected)
    }

    /// Idle: a connected wallet is required before anything else happens.
    pub fn start(&self) -> Result<DeletionState, DeletionFailure> {
        self.wallet()?;
        Ok(DeletionState::ChainCheck)
    }

    pub fn check_chain(&self) -> Result<DeletionState, DeletionFailure> {
        if self.wallet()?.chain_id() == Some(self.chain.chain_id) {
            Ok(DeletionState::Signing)
        } else {
            Ok(DeletionState::Switching)
        }
    }

    pub async fn switch_chain(&self) -> Result<DeletionState, DeletionFailure> {
        let wallet = self.wallet()?;
        wallet.switch_chain(self.chain.chain_id).await.map_err(|err| {
            warn!(chain_id = self.chain.chain_id, error = %err, "Chain switch refused");
            DeletionFailure::SwitchChainRejected {
                chain: self.chain.display_name.to_string(),
            }
        })?;

        Ok(DeletionState::Signing)
    }

    /// The payload to sign, with the token of the current hour.
    pub fn typed_data(&self) -> DeleteRequestTypedData {
        let unix_seconds = u64::try_from(self.clock.now().timestamp()).unwrap_or_default();

        DeleteRequestTypedData {
            chain_id: self.chain.chain_id,
            safe: self.safe,
            safe_tx_hash: self.safe_tx_hash,
            totp: authorization_token(unix_seconds),
        }
    }

    pub async fn sign(&self) -> Result<DeletionState, DeletionFailure> {
        let wallet = self.wallet()?;
        let typed_data = self.typed_data();

        let signature = wallet.sign_typed_data(&typed_data).await.map_err(|err| match err {
            WalletError::Rejected => DeletionFailure::SigningRejected,
            WalletError::Other(reason) => {
                warn!(%reason, "Signing failed");
                DeletionFailure::Failed
            }
        })?;

        Ok(DeletionState::Submitting {
            signature,
            totp: typed_data.totp,
        })
    }

    pub async fn submit(&self, signature: Bytes, totp: u64) -> Result<DeletionState, DeletionFailure> {
        match self
            .client
            .delete_queued_transaction(self.chain.key, self.safe_tx_hash, signature, totp)
            .await
        {
            Ok(()) => Ok(DeletionState::Done(DeletionOutcome::Deleted)),
            Err(err) if err.is_not_found() => Ok(DeletionState::Done(DeletionOutcome::AlreadyRemoved)),
            Err(err) => {
                warn!(safe_tx_hash = %self.safe_tx_hash, error = %err, "Delete request failed");
                Err(DeletionFailure::from_api_error(&err))
            }
        }
    }

    pub async fn step(&self, state: DeletionState) -> Result<DeletionState, DeletionFailure> {
        match state {
            DeletionState::Idle => self.start(),
            DeletionState::ChainCheck => self.check_chain(),
            DeletionState::Switching => self.switch_chain().await,
            DeletionState::Signing => self.sign().await,
            DeletionState::Submitting { signature, totp } => self.submit(signature, totp).await,
            DeletionState::Done(outcome) => Ok(DeletionState::Done(outcome)),
        }
    }

    /// Drives the attempt from `Idle` until it finishes.
    pub async fn run(&self) -> DeletionOutcome {
        let mut state = DeletionState::Idle;
        loop {
            state = match state {
                DeletionState::Done(outcome) => return outcome,
                state => {
                    debug!(state = state.name(), safe_tx_hash = %self.safe_tx_hash, "Deletion step");
                    match self.step(state).await {
                        Ok(next) => next,
                        Err(failure) => return DeletionOutcome::Failed(failure),
                    }
                }
            };
        }
    }
}

/// The single transaction awaiting the user's confirmation.
#[derive(Debug, Default)]
pub struct PendingConfirmation {
    safe_tx_hash: Option<B256>,
}

impl PendingConfirmation {
    /// Returns false when another transaction is already pending.
    pub fn request(&mut self, safe_tx_hash: B256) -> bool {
        if self.safe_tx_hash.is_some() {
            return false;
        }
        self.safe_tx_hash = Some(safe_tx_hash);
        true
    }

    pub fn current(&self) -> Option<B256> {
        self.safe_tx_hash
    }

    pub fn clear(&mut self) -> Option<B256> {
        self.safe_tx_hash.take()
    }
}

/// Runs deletion attempts and applies their result to a queue.
#[derive(Debug)]
pub struct DeletionAuthorizer<T, C = SystemClock> {
    client: Arc<SafeClient<T>>,
    clock: C,
    pending: PendingConfirmation,
}

impl<T: HttpTransport> DeletionAuthorizer<T, SystemClock> {
    pub fn new(client: Arc<SafeClient<T>>) -> Self {
        Self::with_clock(client, SystemClock)
    }
}

impl<T: HttpTransport, C: Clock> DeletionAuthorizer<T, C> {
    pub fn with_clock(client: Arc<SafeClient<T>>, clock: C) -> Self {
        Self {
            client,
            clock,
            pending: PendingConfirmation::default(),
        }
    }

    pub fn pending(&self) -> &PendingConfirmation {
        &self.pending
    }

    /// Asks for confirmation of `safe_tx_hash`. Only one transaction can be pending.
    pub fn confirm(&mut self, safe_tx_hash: B256) -> bool {
        self.pending.request(safe_tx_hash)
    }

    pub fn cancel(&mut self) {
        self.pending.clear();
    }

    /// Deletes the pending transaction, if any, and clears the confirmation afterwards.
    pub async fn delete_pending(
        &mut self,
        queue: &mut QueueReconciler<T>,
        wallet: Option<&dyn WalletCapabilities>,
    ) -> Option<DeletionOutcome> {
        let safe_tx_hash = self.pending.current()?;
        let outcome = self.delete(queue, wallet, safe_tx_hash).await;
        self.pending.clear();

        Some(outcome)
    }

    /// One full attempt. Removes the transaction from `queue` when the service no
    /// longer holds it.
    pub async fn delete(
        &self,
        queue: &mut QueueReconciler<T>,
        wallet: Option<&dyn WalletCapabilities>,
        safe_tx_hash: B256,
    ) -> DeletionOutcome {
        let chain = match self.client.registry().get(queue.chain()) {
            Ok(chain) => chain,
            Err(err) => {
                warn!(error = %err, "Cannot delete on an unregistered chain");
                return DeletionOutcome::Failed(DeletionFailure::Failed);
            }
        };

        let attempt =
            DeletionAttempt::new(&self.client, &self.clock, wallet, chain, queue.safe(), safe_tx_hash);
        let outcome = attempt.run().await;

        if outcome.removes_transaction() {
            queue.remove(safe_tx_hash);
        }
        info!(safe_tx_hash = %safe_tx_hash, outcome = ?outcome, "Deletion attempt finished");

        outcome
    }
}
