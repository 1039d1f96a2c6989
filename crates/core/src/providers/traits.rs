use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use crate::errors::CoreError;

/// Trait abstraction for a spot price source.
///
/// Implementations only report what they resolved: ids they could not
/// price are simply left out of the returned map. Turning an omission into
/// an explicit "unavailable" is the fetcher's job, not the source's.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Current spot price, in the base currency, for each id it could resolve.
    ///
    /// An `Err` means the whole call failed (network, auth, malformed body).
    async fn quote(
        &self,
        asset_ids: &BTreeSet<String>,
    ) -> Result<HashMap<String, Decimal>, CoreError>;
}
