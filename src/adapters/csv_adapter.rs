//! CSV file market data adapter.
//!
//! One file per asset, `{base_path}/{asset}.csv`, with header
//! `timestamp,price,market_cap,volume`. Timestamps are RFC 3339 or
//! `YYYY-MM-DD` (midnight UTC). Empty numeric cells are absent values.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::PathBuf;

use crate::domain::error::DeepcoinError;
use crate::domain::price_point::{PricePoint, Series};
use crate::ports::market_data_port::MarketDataPort;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, asset_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", asset_id))
    }
}

#[async_trait]
impl MarketDataPort for CsvAdapter {
    async fn fetch_daily_series(&self, asset_id: &str) -> Result<Series, DeepcoinError> {
        if asset_id.contains(['/', '\\']) || asset_id.starts_with('.') {
            return Err(DeepcoinError::data_unavailable(format!(
                "invalid asset id '{asset_id}'"
            )));
        }
        let path = self.csv_path(asset_id);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DeepcoinError::data_unavailable(format!("failed to read {}: {}", path.display(), e))
        })?;
        parse_series(&content)
    }
}

/// Parse CSV content into a validated series, sorted by timestamp.
pub fn parse_series(content: &str) -> Result<Series, DeepcoinError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut points = Vec::new();

    for result in rdr.records() {
        let record = result
            .map_err(|e| DeepcoinError::data_unavailable(format!("CSV parse error: {}", e)))?;

        let ts_str = record
            .get(0)
            .ok_or_else(|| DeepcoinError::data_unavailable("missing timestamp column"))?;
        let timestamp = parse_timestamp(ts_str.trim())?;

        let price = parse_optional(record.get(1), "price")?
            .ok_or_else(|| DeepcoinError::data_unavailable("missing price value"))?;
        let market_cap = parse_optional(record.get(2), "market_cap")?;
        let volume_24h = parse_optional(record.get(3), "volume")?;

        points.push(PricePoint {
            timestamp,
            price,
            market_cap,
            volume_24h,
        });
    }

    points.sort_by_key(|p| p.timestamp);
    Series::new(points)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, DeepcoinError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| {
        DeepcoinError::data_unavailable(format!("invalid timestamp '{}': {}", value, e))
    })?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| DeepcoinError::data_unavailable(format!("invalid timestamp '{}'", value)))
}

fn parse_optional(cell: Option<&str>, column: &str) -> Result<Option<f64>, DeepcoinError> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(|e| {
            DeepcoinError::data_unavailable(format!("invalid {} value '{}': {}", column, raw, e))
        }),
    }
}
