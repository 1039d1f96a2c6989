use futures::future::join_all;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::holding::normalize_asset_id;
use crate::models::price::{AssetPrice, PriceMap};
use crate::providers::traits::PriceSource;

/// Batches spot-price lookups against a [`PriceSource`] and classifies
/// every requested asset as priced or unavailable.
///
/// Strategy:
/// 1. One call for the whole set.
/// 2. Assets the batch omitted (or all of them, if the batch failed or timed
///    out) are retried one at a time, concurrently.
/// 3. Whatever is still missing is marked `Unavailable`.
///
/// Only when nothing could be priced *and* some call actually failed is the
/// fetch an error (`UpstreamUnavailable`). No state is kept between calls.
pub struct PriceFetcher {
    source: Arc<dyn PriceSource>,
    timeout: Duration,
}

impl PriceFetcher {
    pub fn new(source: Arc<dyn PriceSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch current prices for `asset_ids`.
    ///
    /// Ids are normalized and deduplicated; blank ids are ignored. The
    /// result contains each remaining id exactly once. An empty input
    /// returns an empty map without touching the source.
    pub async fn fetch_prices<I, S>(&self, asset_ids: I) -> Result<PriceMap, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ids: BTreeSet<String> = asset_ids
            .into_iter()
            .map(|id| normalize_asset_id(id.as_ref()))
            .filter(|id| !id.is_empty())
            .collect();
        if ids.is_empty() {
            return Ok(PriceMap::new());
        }

        let mut prices = PriceMap::new();
        let mut failures: Vec<String> = Vec::new();

        let batch_failed = match self.call(&ids).await {
            Ok(found) => {
                self.collect_priced(&ids, &found, &mut prices);
                false
            }
            Err(e) => {
                warn!(source = self.source.name(), assets = ids.len(), error = %e, "Batch price request failed");
                failures.push(e.to_string());
                true
            }
        };

        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !prices.contains_key(*id))
            .cloned()
            .collect();

        // A single-id batch already was the per-asset call.
        if !missing.is_empty() && ids.len() > 1 {
            debug!(
                missing = missing.len(),
                batch_failed, "Retrying assets individually"
            );
            let retries = missing.iter().map(|id| async move {
                let single = BTreeSet::from([id.clone()]);
                (id, self.call(&single).await)
            });
            for (id, result) in join_all(retries).await {
                match result {
                    Ok(found) => {
                        let single = BTreeSet::from([id.clone()]);
                        self.collect_priced(&single, &found, &mut prices);
                    }
                    Err(e) => {
                        warn!(source = self.source.name(), asset_id = %id, error = %e, "Price request failed");
                        failures.push(format!("{id}: {e}"));
                    }
                }
            }
        }

        if prices.is_empty() && !failures.is_empty() {
            return Err(CoreError::UpstreamUnavailable(format!(
                "{} could not price any of {} asset(s): {}",
                self.source.name(),
                ids.len(),
                failures.join("; ")
            )));
        }

        for id in ids {
            prices.entry(id).or_insert_with_key(|id| {
                warn!(asset_id = %id, "No price available");
                AssetPrice::Unavailable
            });
        }

        Ok(prices)
    }

    /// One outbound call, bounded by the configured timeout. A timeout is
    /// reported like any other failed call.
    async fn call(&self, ids: &BTreeSet<String>) -> Result<HashMap<String, Decimal>, CoreError> {
        match tokio::time::timeout(self.timeout, self.source.quote(ids)).await {
            Ok(result) => result,
            Err(_) => Err(CoreError::Network(format!(
                "{} request timed out after {}ms",
                self.source.name(),
                self.timeout.as_millis()
            ))),
        }
    }

    /// Copy valid prices for `wanted` ids out of a source response.
    /// Negative prices are dropped so the id ends up unavailable.
    fn collect_priced(
        &self,
        wanted: &BTreeSet<String>,
        found: &HashMap<String, Decimal>,
        prices: &mut PriceMap,
    ) {
        for id in wanted {
            let Some(price) = found.get(id) else {
                continue;
            };
            if *price < Decimal::ZERO {
                warn!(source = self.source.name(), asset_id = %id, %price, "Ignoring negative price");
                continue;
            }
            prices.insert(id.clone(), AssetPrice::Priced(*price));
        }
    }
}
