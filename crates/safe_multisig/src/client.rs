use alloy_primitives::{Address, Bytes, B256};
use tracing::{debug, instrument};

use crate::{
    chains::{ChainKey, ChainRegistry},
    error::Result,
    http::{HttpClient, HttpRequest, HttpTransport, ReqwestTransport, RetryPolicy},
    transaction_data::{DeleteTransactionBody, OwnerSafes, SafeInfo, TransactionPage},
};

/// Typed access to the Safe transaction service of every registered chain.
#[derive(Debug, Clone)]
pub struct SafeClient<T> {
    registry: ChainRegistry,
    http: HttpClient<T>,
}

impl SafeClient<ReqwestTransport> {
    /// Client using reqwest and the default 3s rate limit retry.
    pub fn from_registry(registry: ChainRegistry) -> Self {
        Self::new(registry, ReqwestTransport::default())
    }
}

impl<T: HttpTransport> SafeClient<T> {
    pub fn new(registry: ChainRegistry, transport: T) -> Self {
        Self {
            registry,
            http: HttpClient::new(transport),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.http = self.http.with_policy(policy);
        self
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Safes on `chain` that list `owner` as an owner.
    #[instrument(skip(self))]
    pub async fn fetch_owner_safes(&self, chain: ChainKey, owner: Address) -> Result<OwnerSafes> {
        let base = self.registry.api_base_url(chain)?;
        let url = format!("{}/api/v1/owners/{}/safes/", base, owner.to_checksum(None));

        self.http.request_json(HttpRequest::get(url), true).await
    }

    #[instrument(skip(self))]
    pub async fn fetch_safe_info(&self, chain: ChainKey, safe: Address) -> Result<SafeInfo> {
        let base = self.registry.api_base_url(chain)?;
        let url = format!("{}/api/v1/safes/{}/", base, safe.to_checksum(None));

        self.http.request_json(HttpRequest::get(url), true).await
    }

    /// One page of unexecuted, queued transactions.
    ///
    /// Deployments without the `queued` filter answer 404; the unfiltered listing is
    /// then fetched with the same `limit`/`offset` and filtered here, dropping anything
    /// executed and, when `min_nonce` is given, anything below it. `count`, `next` and
    /// `previous` of that fallback describe the unfiltered set.
    #[instrument(skip(self))]
    pub async fn fetch_queued_transactions(
        &self,
        chain: ChainKey,
        safe: Address,
        limit: u64,
        offset: u64,
        min_nonce: Option<u64>,
    ) -> Result<TransactionPage> {
        let base = self.registry.api_base_url(chain)?;
        let listing = format!("{}/api/v2/safes/{}/multisig-transactions/", base, safe.to_checksum(None));
        let primary_url =
            format!("{}?executed=false&queued=true&limit={}&offset={}", listing, limit, offset);

        match self.http.request_json::<TransactionPage>(HttpRequest::get(primary_url), true).await {
            Err(err) if err.is_not_found() => {
                debug!("Queued filter unsupported, falling back to the full listing");
            }
            result => return result,
        }

        let fallback_url = format!("{}?limit={}&offset={}", listing, limit, offset);
        let mut page: TransactionPage =
            self.http.request_json(HttpRequest::get(fallback_url), true).await?;

        page.results.retain(|tx| {
            !tx.shows_execution() && min_nonce.map_or(true, |min_nonce| tx.nonce >= min_nonce)
        });

        Ok(page)
    }

    /// Deletes a queued transaction. Sent once, never retried.
    #[instrument(skip(self, signature))]
    pub async fn delete_queued_transaction(
        &self,
        chain: ChainKey,
        safe_tx_hash: B256,
        signature: Bytes,
        totp: u64,
    ) -> Result<()> {
        let base = self.registry.api_base_url(chain)?;
        let url = format!("{}/api/v2/multisig-transactions/{}/", base, safe_tx_hash);
        let body = serde_json::to_value(DeleteTransactionBody { signature, totp })?;

        self.http.request_empty(HttpRequest::delete(url, body), "Delete failed").await
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::{
        error::SafeApiError,
        http::{HttpMethod, HttpResponse, MockHttpTransport},
    };

    const SAFE: &str = "0x000000000000000000000000000000000000dEaD";

    fn safe() -> Address {
        SAFE.parse().unwrap()
    }

    fn client(transport: MockHttpTransport) -> SafeClient<MockHttpTransport> {
        SafeClient::new(ChainRegistry::new("http://service"), transport)
            .with_retry_policy(RetryPolicy::immediate())
    }

    fn tx_json(nonce: u64, executed: bool, executor: Option<&str>, execution_date: Option<&str>) -> serde_json::Value {
        json!({
            "safeTxHash": format!("0x{:064x}", nonce * 100 + executed as u64),
            "nonce": nonce,
            "isExecuted": executed,
            "executor": executor,
            "executionDate": execution_date,
        })
    }

    #[tokio::test]
    async fn owner_safes_and_safe_info_urls() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |request| {
            calls += 1;
            assert_eq!(request.method, HttpMethod::Get);
            match calls {
                1 => {
                    assert_eq!(request.url, format!("http://service/eth/api/v1/owners/{}/safes/", SAFE));
                    Ok(HttpResponse::new(200, format!(r#"{{"safes": ["{}"]}}"#, SAFE)))
                }
                _ => {
                    assert_eq!(request.url, format!("http://service/base/api/v1/safes/{}/", SAFE));
                    Ok(HttpResponse::new(200, r#"{"nonce": "12", "threshold": 2}"#))
                }
            }
        });

        let client = client(transport);
        let owned = client.fetch_owner_safes(ChainKey::Eth, safe()).await.unwrap();
        assert_eq!(owned.safes, vec![safe()]);

        let info = client.fetch_safe_info(ChainKey::Base, safe()).await.unwrap();
        assert_eq!(info.nonce, 12);
    }

    #[tokio::test]
    async fn primary_listing_is_returned_unfiltered() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|request| {
            assert_eq!(
                request.url,
                format!(
                    "http://service/eth/api/v2/safes/{}/multisig-transactions/?executed=false&queued=true&limit=20&offset=40",
                    SAFE
                )
            );
            let body = json!({
                "count": 1, "next": null, "previous": null,
                "results": [tx_json(4, false, None, None)],
            });
            Ok(HttpResponse::new(200, body.to_string()))
        });

        let page = client(transport)
            .fetch_queued_transactions(ChainKey::Eth, safe(), 20, 40, Some(10))
            .await
            .unwrap();

        // min_nonce only applies to the fallback path
        assert_eq!(page.results.len(), 1);
    }

    #[tokio::test]
    async fn not_found_falls_back_once_and_filters() {
        let urls = Arc::new(Mutex::new(Vec::new()));
        let seen = urls.clone();

        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(2).returning(move |request| {
            let mut seen = seen.lock().unwrap();
            seen.push(request.url.clone());
            if seen.len() == 1 {
                return Ok(HttpResponse::new(404, "Not found"));
            }
            let body = json!({
                "count": 6,
                "next": "http://service/next",
                "previous": null,
                "results": [
                    tx_json(2, false, None, None),
                    tx_json(5, true, None, None),
                    tx_json(5, false, Some(SAFE), None),
                    tx_json(6, false, None, Some("2024-05-10T11:00:00Z")),
                    tx_json(6, false, None, None),
                    tx_json(7, false, None, None),
                ],
            });
            Ok(HttpResponse::new(200, body.to_string()))
        });

        let page = client(transport)
            .fetch_queued_transactions(ChainKey::Gno, safe(), 20, 0, Some(5))
            .await
            .unwrap();

        let urls = urls.lock().unwrap();
        assert_eq!(urls.len(), 2);
        assert!(urls[0].ends_with("?executed=false&queued=true&limit=20&offset=0"));
        assert_eq!(
            urls[1],
            format!("http://service/gno/api/v2/safes/{}/multisig-transactions/?limit=20&offset=0", SAFE)
        );

        let nonces: Vec<u64> = page.results.iter().map(|tx| tx.nonce).collect();
        assert_eq!(nonces, vec![6, 7]);
        assert!(page.results.iter().all(|tx| !tx.shows_execution()));
        // pagination metadata describes the unfiltered listing
        assert_eq!(page.count, 6);
        assert!(page.next.is_some());
    }

    #[tokio::test]
    async fn fallback_without_min_nonce_keeps_low_nonces() {
        let mut transport = MockHttpTransport::new();
        let mut calls = 0;
        transport.expect_send().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                return Ok(HttpResponse::new(404, ""));
            }
            let body = json!({
                "count": 2, "next": null, "previous": null,
                "results": [tx_json(1, false, None, None), tx_json(2, true, None, None)],
            });
            Ok(HttpResponse::new(200, body.to_string()))
        });

        let page = client(transport)
            .fetch_queued_transactions(ChainKey::Eth, safe(), 20, 0, None)
            .await
            .unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].nonce, 1);
    }

    #[tokio::test]
    async fn other_listing_errors_are_not_masked() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(|_| Ok(HttpResponse::new(500, "boom")));

        let err = client(transport)
            .fetch_queued_transactions(ChainKey::Eth, safe(), 20, 0, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn unsupported_chain_makes_no_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_send().never();

        let client = SafeClient::new(ChainRegistry::with_chains("http://service", [ChainKey::Eth]), transport);
        let err = client.fetch_safe_info(ChainKey::Avax, safe()).await.unwrap_err();
        assert!(matches!(err, SafeApiError::UnsupportedChain(_)));
    }

    #[tokio::test]
    async fn delete_sends_signature_and_totp_once() {
        let hash = B256::repeat_byte(0xab);
        let mut transport = MockHttpTransport::new();
        transport.expect_send().times(1).returning(move |request| {
            assert_eq!(request.method, HttpMethod::Delete);
            assert_eq!(request.url, format!("http://service/pol/api/v2/multisig-transactions/{}/", hash));
            assert_eq!(request.body, Some(json!({ "signature": "0x0102", "totp": 481234 })));
            Ok(HttpResponse::new(429, ""))
        });

        let err = client(transport)
            .delete_queued_transaction(ChainKey::Pol, hash, Bytes::from(vec![1, 2]), 481_234)
            .await
            .unwrap_err();
        assert!(matches!(err, SafeApiError::Api { status: 429, message } if message == "Delete failed: 429"));
    }
}
