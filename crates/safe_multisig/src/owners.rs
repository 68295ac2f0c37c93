use std::collections::BTreeMap;

use alloy_primitives::Address;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::{chains::ChainKey, client::SafeClient, http::HttpTransport, notice::Notice};

pub const PARTIAL_FAILURE_NOTICE: &str = "Some chains failed to load.";

/// Safes owned by one address, merged across every registered chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerSafesSummary {
    pub safes: BTreeMap<ChainKey, Vec<Address>>,
    pub failed: Vec<ChainKey>,
    pub notice: Option<Notice>,
}

impl OwnerSafesSummary {
    pub fn has_safes(&self) -> bool {
        self.safes.values().any(|safes| !safes.is_empty())
    }
}

/// Looks up `owner` on every chain concurrently and waits for all of them.
///
/// A chain that fails is skipped and reported, it never hides the others.
pub async fn fetch_all_owner_safes<T: HttpTransport>(
    client: &SafeClient<T>,
    owner: Address,
) -> OwnerSafesSummary {
    let lookups = client.registry().keys().map(|chain| async move {
        (chain, client.fetch_owner_safes(chain, owner).await)
    });

    let mut summary = OwnerSafesSummary::default();
    for (chain, result) in join_all(lookups).await {
        match result {
            Ok(owned) => {
                debug!(%chain, count = owned.safes.len(), "Loaded owner safes");
                summary.safes.insert(chain, owned.safes);
            }
            Err(err) => {
                warn!(%chain, error = %err, "Failed to load owner safes");
                summary.failed.push(chain);
            }
        }
    }

    if !summary.failed.is_empty() {
        summary.notice = Some(Notice::error(PARTIAL_FAILURE_NOTICE));
    }

    summary
}
