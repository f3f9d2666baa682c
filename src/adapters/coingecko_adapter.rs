//! CoinGecko market data adapter.
//!
//! Reads `/coins/{id}/market_chart` at daily interval. Prices drive the rows;
//! market caps and volumes are joined on the same millisecond timestamp and
//! left absent when the upstream arrays lack them.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::domain::error::DeepcoinError;
use crate::domain::price_point::{PricePoint, Series};
use crate::domain::settings::Settings;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    market_caps: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    total_volumes: Vec<(f64, Option<f64>)>,
}

pub struct CoinGeckoAdapter {
    client: Client,
    base_url: String,
    vs_currency: String,
    days: u32,
}

impl CoinGeckoAdapter {
    pub fn new(
        base_url: impl Into<String>,
        vs_currency: impl Into<String>,
        days: u32,
        timeout: Duration,
    ) -> Result<Self, DeepcoinError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deepcoin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeepcoinError::data_unavailable(format!("HTTP client setup failed: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            vs_currency: vs_currency.into(),
            days,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, DeepcoinError> {
        Self::new(
            settings.base_url.clone(),
            settings.vs_currency.clone(),
            settings.history_days,
            settings.fetch_timeout,
        )
    }

    fn chart_url(&self, asset_id: &str) -> String {
        format!("{}/coins/{}/market_chart", self.base_url, asset_id)
    }
}

#[async_trait]
impl MarketDataPort for CoinGeckoAdapter {
    async fn fetch_daily_series(&self, asset_id: &str) -> Result<Series, DeepcoinError> {
        if !is_coin_id(asset_id) {
            return Err(DeepcoinError::data_unavailable(format!(
                "invalid asset id '{asset_id}'"
            )));
        }
        let url = self.chart_url(asset_id);
        let days = self.days.to_string();
        debug!(%url, "requesting market chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("days", days.as_str()),
                ("interval", "daily"),
            ])
            .send()
            .await
            .map_err(|e| DeepcoinError::data_unavailable(format!("CoinGecko request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeepcoinError::data_unavailable(format!(
                "CoinGecko returned status {} for {}",
                status.as_u16(),
                asset_id
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DeepcoinError::data_unavailable(format!("CoinGecko body read failed: {e}")))?;
        parse_market_chart(&body)
    }
}

/// CoinGecko ids are lower-case slugs such as `bitcoin` or `usd-coin`.
fn is_coin_id(asset_id: &str) -> bool {
    !asset_id.is_empty()
        && asset_id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Parse a `market_chart` payload into a validated series.
pub fn parse_market_chart(body: &str) -> Result<Series, DeepcoinError> {
    let chart: MarketChart = serde_json::from_str(body)
        .map_err(|e| DeepcoinError::data_unavailable(format!("malformed market chart: {e}")))?;

    let caps = by_timestamp(&chart.market_caps);
    let volumes = by_timestamp(&chart.total_volumes);

    let mut points = Vec::with_capacity(chart.prices.len());
    for &(ts, price) in &chart.prices {
        let millis = ts as i64;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis).ok_or_else(|| {
            DeepcoinError::data_unavailable(format!("timestamp {millis} out of range"))
        })?;
        let price = price.ok_or_else(|| {
            DeepcoinError::data_unavailable(format!("missing price at {}", timestamp.to_rfc3339()))
        })?;
        points.push(PricePoint {
            timestamp,
            price,
            market_cap: caps.get(&millis).copied().flatten(),
            volume_24h: volumes.get(&millis).copied().flatten(),
        });
    }

    points.sort_by_key(|p| p.timestamp);
    Series::new(points)
}

fn by_timestamp(rows: &[(f64, Option<f64>)]) -> HashMap<i64, Option<f64>> {
    rows.iter().map(|&(ts, v)| (ts as i64, v)).collect()
}
