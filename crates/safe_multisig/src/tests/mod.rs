//! Queue load, eligibility and deletion against a scripted transaction service.

use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, PrimitiveSignature, B256};
use serde_json::{json, Value};

use crate::{
    chains::{ChainKey, ChainRegistry},
    client::SafeClient,
    deletion::{DeletionAuthorizer, DeletionOutcome},
    http::{HttpMethod, HttpRequest, HttpResponse, MockHttpTransport, RetryPolicy},
    notice::NoticeLevel,
    queue::{Eligibility, LoadOutcome, QueueReconciler},
    typed_data::DeleteRequestTypedData,
    utils::normalize_address,
    wallet::{LocalWallet, WalletCapabilities},
};

// anvil account #0
const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcab78d7690ff80f";
const OWNER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
const SAFE: &str = "0x000000000000000000000000000000000000dEaD";

fn hash(nonce: u64, index: u64) -> B256 {
    B256::left_padding_from(&(nonce * 10 + index).to_be_bytes())
}

fn queued_page() -> Value {
    let results: Vec<Value> = [3u64, 5, 6, 6, 7]
        .iter()
        .enumerate()
        .map(|(index, nonce)| {
            // only the second nonce 6 proposal comes from the owner, through a delegate
            let (proposer, delegate) = if index == 3 {
                (Value::Null, json!(OWNER.to_uppercase().replacen("0X", "0x", 1)))
            } else {
                (json!("0x0000000000000000000000000000000000000001"), Value::Null)
            };
            json!({
                "safeTxHash": hash(*nonce, index as u64),
                "nonce": nonce,
                "submissionDate": "2024-05-10T11:00:00Z",
                "proposer": proposer,
                "proposedByDelegate": delegate,
                "isExecuted": false,
            })
        })
        .collect();

    json!({ "count": 5, "next": null, "previous": null, "results": results })
}

#[tokio::test]
async fn load_filter_and_delete_own_transaction() {
    let requests: Arc<Mutex<Vec<HttpRequest>>> = Arc::default();
    let seen = requests.clone();

    let mut transport = MockHttpTransport::new();
    transport.expect_send().times(3).returning(move |request| {
        seen.lock().unwrap().push(request.clone());
        match request.method {
            HttpMethod::Get if request.url.contains("/api/v1/safes/") => {
                Ok(HttpResponse::new(200, r#"{"nonce": "5"}"#))
            }
            HttpMethod::Get => Ok(HttpResponse::new(200, queued_page().to_string())),
            HttpMethod::Delete => Ok(HttpResponse::new(204, "")),
        }
    });

    let client = Arc::new(
        SafeClient::new(ChainRegistry::new("http://service"), transport)
            .with_retry_policy(RetryPolicy::immediate()),
    );
    let safe = normalize_address(SAFE).unwrap();
    let mut queue = QueueReconciler::new(client.clone(), ChainKey::Gno, safe);

    assert_eq!(queue.refresh().await, LoadOutcome::Loaded { received: 5, total: 4 });
    let nonces: Vec<u64> = queue.transactions().iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, vec![5, 6, 6, 7]);

    let wallet = LocalWallet::from_private_key(PRIVATE_KEY).unwrap().with_chain_id(100);
    let owner = wallet.address();
    assert_eq!(owner, Some(normalize_address(OWNER).unwrap()));

    let own_hash = hash(6, 3);
    let eligibility = queue.eligibility(owner);
    assert_eq!(eligibility[&own_hash], Eligibility::Yours);
    assert_eq!(eligibility[&hash(6, 2)], Eligibility::NotYours);
    assert!(queue.has_eligible(owner));

    let mut authorizer = DeletionAuthorizer::new(client);
    assert!(authorizer.confirm(own_hash));
    let outcome = authorizer.delete_pending(&mut queue, Some(&wallet)).await.unwrap();

    assert_eq!(outcome, DeletionOutcome::Deleted);
    assert_eq!(outcome.notice().level, NoticeLevel::Info);
    assert!(queue.find(own_hash).is_none());
    assert_eq!(queue.transactions().len(), 3);
    assert!(!queue.has_eligible(owner));
    assert_eq!(authorizer.pending().current(), None);

    // the service can recover the proposer from what was sent
    let requests = requests.lock().unwrap();
    let delete = requests.last().unwrap();
    assert_eq!(delete.method, HttpMethod::Delete);
    assert!(delete.url.ends_with(&format!("/gno/api/v2/multisig-transactions/{}/", own_hash)));

    let body = delete.body.as_ref().unwrap();
    let totp = body["totp"].as_u64().unwrap();
    let signature: alloy_primitives::Bytes = serde_json::from_value(body["signature"].clone()).unwrap();
    let typed_data = DeleteRequestTypedData {
        chain_id: 100,
        safe,
        safe_tx_hash: own_hash,
        totp,
    };
    let recovered = PrimitiveSignature::try_from(signature.as_ref())
        .unwrap()
        .recover_address_from_prehash(&typed_data.signing_hash())
        .unwrap();
    assert_eq!(Some(recovered), owner);
}

#[tokio::test]
async fn stale_entries_drop_out_when_the_nonce_advances() {
    let mut transport = MockHttpTransport::new();
    let mut calls = 0;
    transport.expect_send().times(4).returning(move |request| {
        calls += 1;
        let body = match calls {
            1 => json!({ "nonce": 5 }),
            3 => json!({ "nonce": 7 }),
            _ => queued_page(),
        };
        assert_eq!(request.method, HttpMethod::Get);
        Ok(HttpResponse::new(200, body.to_string()))
    });

    let client = Arc::new(SafeClient::new(ChainRegistry::default(), transport));
    let mut queue = QueueReconciler::new(client, ChainKey::Eth, Address::repeat_byte(1));

    queue.refresh().await;
    assert_eq!(queue.transactions().len(), 4);

    // the listing still reports old proposals after execution
    queue.refresh().await;
    assert_eq!(queue.safe_nonce(), Some(7));
    let nonces: Vec<u64> = queue.transactions().iter().map(|tx| tx.nonce).collect();
    assert_eq!(nonces, vec![7]);
}
