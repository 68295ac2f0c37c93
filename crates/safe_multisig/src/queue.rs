use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, B256};
use tracing::{debug, warn};

use crate::{
    chains::ChainKey,
    client::SafeClient,
    consts::PAGE_SIZE,
    error::Result,
    http::HttpTransport,
    notice::Notice,
    transaction_data::{QueuedTransaction, TransactionPage},
};

pub const RATE_LIMIT_NOTICE: &str = "Rate limited. Please wait while we retry every 3s.";
pub const LOAD_FAILED_NOTICE: &str = "Failed to load queue. Try again later.";

/// Whether the connected wallet may delete a queued transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eligibility {
    Yours,
    NotYours,
    Unknown,
}

/// The delegate proposer wins over the proposer. Address equality ignores hex casing.
pub fn eligibility_of(tx: &QueuedTransaction, wallet: Option<Address>) -> Eligibility {
    match tx.effective_proposer() {
        None => Eligibility::Unknown,
        Some(proposer) if Some(proposer) == wallet => Eligibility::Yours,
        Some(_) => Eligibility::NotYours,
    }
}

pub fn eligibility_map(
    transactions: &[QueuedTransaction],
    wallet: Option<Address>,
) -> HashMap<B256, Eligibility> {
    transactions.iter().map(|tx| (tx.safe_tx_hash, eligibility_of(tx, wallet))).collect()
}

pub fn has_eligible(transactions: &[QueuedTransaction], wallet: Option<Address>) -> bool {
    transactions.iter().any(|tx| eligibility_of(tx, wallet) == Eligibility::Yours)
}

/// Drops every transaction below the Safe nonce.
pub fn apply_nonce_floor(transactions: &mut Vec<QueuedTransaction>, floor: u64) {
    transactions.retain(|tx| tx.nonce >= floor);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { received: usize, total: usize },
    /// Reads are still being throttled. A persistent retry notice is set.
    RateLimited,
    /// The accumulated list was left untouched.
    Failed(Notice),
}

/// In-memory queue of one Safe, reconciled against its on-chain nonce.
#[derive(Debug)]
pub struct QueueReconciler<T> {
    client: Arc<SafeClient<T>>,
    chain: ChainKey,
    safe: Address,
    page_size: u64,
    safe_nonce: Option<u64>,
    transactions: Vec<QueuedTransaction>,
    retry_notice: Option<String>,
    next_offset: u64,
    has_more: bool,
}

impl<T: HttpTransport> QueueReconciler<T> {
    pub fn new(client: Arc<SafeClient<T>>, chain: ChainKey, safe: Address) -> Self {
        Self {
            client,
            chain,
            safe,
            page_size: PAGE_SIZE,
            safe_nonce: None,
            transactions: Vec::new(),
            retry_notice: None,
            next_offset: 0,
            has_more: false,
        }
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn chain(&self) -> ChainKey {
        self.chain
    }

    pub fn safe(&self) -> Address {
        self.safe
    }

    pub fn safe_nonce(&self) -> Option<u64> {
        self.safe_nonce
    }

    pub fn transactions(&self) -> &[QueuedTransaction] {
        &self.transactions
    }

    pub fn retry_notice(&self) -> Option<&str> {
        self.retry_notice.as_deref()
    }

    /// Whether the last page pointed at a further page.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn find(&self, safe_tx_hash: B256) -> Option<&QueuedTransaction> {
        self.transactions.iter().find(|tx| tx.safe_tx_hash == safe_tx_hash)
    }

    pub fn remove(&mut self, safe_tx_hash: B256) -> Option<QueuedTransaction> {
        let index = self.transactions.iter().position(|tx| tx.safe_tx_hash == safe_tx_hash)?;
        Some(self.transactions.remove(index))
    }

    pub fn eligibility(&self, wallet: Option<Address>) -> HashMap<B256, Eligibility> {
        eligibility_map(&self.transactions, wallet)
    }

    pub fn has_eligible(&self, wallet: Option<Address>) -> bool {
        has_eligible(&self.transactions, wallet)
    }

    /// Fresh load from offset zero. Also used when the view becomes visible again.
    pub async fn refresh(&mut self) -> LoadOutcome {
        self.load_page(0).await
    }

    /// Loads the page after the last one, if the service reported one.
    pub async fn load_more(&mut self) -> Option<LoadOutcome> {
        if !self.has_more {
            return None;
        }
        Some(self.load_page(self.next_offset).await)
    }

    /// Loads one page at `offset` and merges it into the accumulated queue.
    ///
    /// Offset zero refreshes the nonce floor and replaces the queue; later offsets
    /// append. The floor is then applied to the whole queue.
    pub async fn load_page(&mut self, offset: u64) -> LoadOutcome {
        self.retry_notice = None;

        match self.try_load_page(offset).await {
            Ok(received) => LoadOutcome::Loaded {
                received,
                total: self.transactions.len(),
            },
            Err(err) if err.is_rate_limited() => {
                warn!(chain = %self.chain, safe = %self.safe, "Queue load rate limited");
                self.retry_notice = Some(RATE_LIMIT_NOTICE.to_string());
                LoadOutcome::RateLimited
            }
            Err(err) => {
                warn!(chain = %self.chain, safe = %self.safe, error = %err, "Failed to load queue");
                LoadOutcome::Failed(Notice::error(LOAD_FAILED_NOTICE))
            }
        }
    }

    async fn try_load_page(&mut self, offset: u64) -> Result<usize> {
        let floor = if offset == 0 {
            let info = self.client.fetch_safe_info(self.chain, self.safe).await?;
            debug!(nonce = info.nonce, "Refreshed Safe nonce");
            self.safe_nonce = Some(info.nonce);
            Some(info.nonce)
        } else {
            self.safe_nonce
        };

        let page = self
            .client
            .fetch_queued_transactions(self.chain, self.safe, self.page_size, offset, floor)
            .await?;

        Ok(self.apply_page(offset, floor, page))
    }

    /// Merges `page` fetched at `offset` and applies `floor` across the whole queue.
    /// Returns the number of transactions the page carried.
    pub fn apply_page(&mut self, offset: u64, floor: Option<u64>, page: TransactionPage) -> usize {
        let received = page.results.len();

        if offset == 0 {
            self.transactions = page.results;
        } else {
            self.transactions.extend(page.results);
        }
        if let Some(floor) = floor {
            apply_nonce_floor(&mut self.transactions, floor);
        }

        self.has_more = page.next.is_some();
        self.next_offset = offset + self.page_size;

        received
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::{
        chains::ChainRegistry,
        http::{HttpResponse, MockHttpTransport, RetryPolicy},
    };

    fn address(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    fn tx(nonce: u64, id: u8) -> QueuedTransaction {
        QueuedTransaction {
            safe_tx_hash: B256::repeat_byte(id),
            nonce,
            submission_date: None,
            proposer: None,
            proposed_by_delegate: None,
            is_executed: false,
            executor: None,
            execution_date: None,
        }
    }

    fn page_body(nonces: &[u64], next: Option<&str>) -> String {
        let results: Vec<_> = nonces
            .iter()
            .enumerate()
            .map(|(i, nonce)| json!({ "safeTxHash": format!("0x{:064x}", nonce * 1000 + i as u64), "nonce": nonce }))
            .collect();
        json!({ "count": nonces.len(), "next": next, "previous": null, "results": results }).to_string()
    }

    fn reconciler(transport: MockHttpTransport) -> QueueReconciler<MockHttpTransport> {
        let client = SafeClient::new(ChainRegistry::new("http://service"), transport)
            .with_retry_policy(RetryPolicy::immediate().with_max_attempts(2));
        QueueReconciler::new(Arc::new(client), ChainKey::Eth, address(0xaa))
    }

    fn nonces(reconciler: &QueueReconciler<MockHttpTransport>) -> Vec<u64> {
        reconciler.transactions().iter().map(|tx| tx.nonce).collect()
    }

    #[test]
    fn eligibility_rules() {
        let wallet = address(1);

        assert_eq!(eligibility_of(&tx(0, 1), Some(wallet)), Eligibility::Unknown);

        let mine = QueuedTransaction { proposer: Some(wallet), ..tx(0, 2) };
        assert_eq!(eligibility_of(&mine, Some(wallet)), Eligibility::Yours);
        assert_eq!(eligibility_of(&mine, None), Eligibility::NotYours);

        // the delegate decides even when the raw proposer matches
        let delegated = QueuedTransaction {
            proposer: Some(wallet),
            proposed_by_delegate: Some(address(2)),
            ..tx(0, 3)
        };
        assert_eq!(eligibility_of(&delegated, Some(wallet)), Eligibility::NotYours);
        assert_eq!(eligibility_of(&delegated, Some(address(2))), Eligibility::Yours);

        let map = eligibility_map(&[mine.clone(), delegated.clone()], Some(wallet));
        assert_eq!(map[&mine.safe_tx_hash], Eligibility::Yours);
        assert_eq!(map[&delegated.safe_tx_hash], Eligibility::NotYours);

        assert!(has_eligible(&[delegated.clone(), mine], Some(wallet)));
        assert!(!has_eligible(&[delegated], Some(wallet)));
    }

    #[test]
    fn eligibility_ignores_hex_casing() {
        let tx: QueuedTransaction = serde_json::from_value(json!({
            "safeTxHash": format!("0x{:064x}", 1),
            "nonce": 1,
            "proposer": "0xABCDEF0123456789ABCDEF0123456789ABCDEF01",
        }))
        .unwrap();
        let wallet: Address = "0xabcdef0123456789abcdef0123456789abcdef01".parse().unwrap();

        assert_eq!(eligibility_of(&tx, Some(wallet)), Eligibility::Yours);
    }

    #[test]
    fn floor_filter_leaves_nothing_below_the_floor() {
        let mut txs: Vec<_> = [3u64, 5, 6, 6, 7, 0, 4].iter().enumerate().map(|(i, n)| tx(*n, i as u8)).collect();
        apply_nonce_floor(&mut txs, 5);
        assert!(txs.iter().all(|tx| tx.nonce >= 5));
        assert_eq!(txs.len(), 4);
    }

    #[tokio::test]
    async fn fresh_load_applies_the_nonce_floor() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(2).returning(|request| {
            if request.url.contains("/api/v1/safes/") {
                return Ok(HttpResponse::new(200, r#"{"nonce": "5"}"#));
            }
            assert!(request.url.contains("queued=true&limit=20&offset=0"));
            Ok(HttpResponse::new(200, page_body(&[3, 5, 6, 6, 7], None)))
        });

        let mut queue = reconciler(transport);
        let outcome = queue.refresh().await;

        assert_eq!(outcome, LoadOutcome::Loaded { received: 5, total: 4 });
        assert_eq!(queue.safe_nonce(), Some(5));
        assert_eq!(nonces(&queue), vec![5, 6, 6, 7]);
        assert!(!queue.has_more());
    }

    #[tokio::test]
    async fn later_pages_append_without_refetching_the_nonce() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0;
        transport.expect_send().times(3).returning(move |request| {
            calls += 1;
            match calls {
                1 => Ok(HttpResponse::new(200, r#"{"nonce": 5}"#)),
                2 => Ok(HttpResponse::new(200, page_body(&[5, 6], Some("http://service/next")))),
                _ => {
                    assert!(request.url.contains("limit=2&offset=2"));
                    Ok(HttpResponse::new(200, page_body(&[4, 8], None)))
                }
            }
        });

        let mut queue = reconciler(transport).with_page_size(2);
        queue.refresh().await;
        assert!(queue.has_more());

        let outcome = queue.load_more().await;
        assert_eq!(outcome, Some(LoadOutcome::Loaded { received: 2, total: 3 }));
        assert_eq!(nonces(&queue), vec![5, 6, 8]);
        assert_eq!(queue.load_more().await, None);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_accumulated_queue() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0;
        transport.expect_send().times(4).returning(move |_| {
            calls += 1;
            match calls {
                1 => Ok(HttpResponse::new(200, r#"{"nonce": 1}"#)),
                2 => Ok(HttpResponse::new(200, page_body(&[1, 2], None))),
                3 => Ok(HttpResponse::new(200, r#"{"nonce": 2}"#)),
                _ => Ok(HttpResponse::new(502, "bad gateway")),
            }
        });

        let mut queue = reconciler(transport);
        queue.refresh().await;
        assert_eq!(nonces(&queue), vec![1, 2]);

        let outcome = queue.refresh().await;
        assert_eq!(outcome, LoadOutcome::Failed(Notice::error(LOAD_FAILED_NOTICE)));
        assert_eq!(nonces(&queue), vec![1, 2]);
        assert_eq!(queue.retry_notice(), None);
    }

    #[tokio::test]
    async fn exhausted_rate_limit_sets_a_retry_notice() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(2).returning(|_| Ok(HttpResponse::new(429, "")));

        let mut queue = reconciler(transport);
        assert_eq!(queue.refresh().await, LoadOutcome::RateLimited);
        assert_eq!(queue.retry_notice(), Some(RATE_LIMIT_NOTICE));
        assert!(queue.transactions().is_empty());
    }

    #[test]
    fn remove_and_find() {
        let client = SafeClient::new(ChainRegistry::default(), MockHttpTransport::new());
        let mut queue = QueueReconciler::new(Arc::new(client), ChainKey::Eth, address(1));
        queue.apply_page(
            0,
            None,
            TransactionPage { results: vec![tx(1, 1), tx(2, 2)], ..Default::default() },
        );

        assert!(queue.find(B256::repeat_byte(2)).is_some());
        assert_eq!(queue.remove(B256::repeat_byte(2)).map(|tx| tx.nonce), Some(2));
        assert_eq!(queue.remove(B256::repeat_byte(2)), None);
        assert_eq!(queue.transactions().len(), 1);
    }
}
