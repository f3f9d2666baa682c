//! Market data access port trait.

use async_trait::async_trait;

use crate::domain::error::DeepcoinError;
use crate::domain::price_point::Series;

#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Most recent daily observations for `asset_id`, oldest first.
    ///
    /// Transport failures, upstream errors and malformed payloads all map to
    /// `DeepcoinError::DataUnavailable`.
    async fn fetch_daily_series(&self, asset_id: &str) -> Result<Series, DeepcoinError>;
}
