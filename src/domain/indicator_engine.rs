//! Indicator table for a daily series.
//!
//! Windows shrink to the available history (`min(canonical, L-1)`) so that a
//! short series still yields values. Those values are statistically weak;
//! the degraded accuracy is accepted in exchange for always answering. MACD
//! keeps its canonical 12/26/9 windows and may be entirely undefined.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::error::DeepcoinError;
use crate::domain::indicator::{
    calculate_ema, calculate_macd_default, calculate_obv, calculate_roc, calculate_rsi,
    calculate_sma, IndicatorSeries,
};
use crate::domain::price_point::Series;

pub const SMA_WINDOW: usize = 20;
pub const SMA_WINDOW_LARGE: usize = 50;
pub const RSI_WINDOW: usize = 14;

/// Lags in rows (days) behind the 24h / 7d / 30d change columns.
pub const LAG_24H: usize = 1;
pub const LAG_7D: usize = 7;
pub const LAG_30D: usize = 30;

/// One series entry with its derived indicators. Undefined values serialize
/// as `null`; every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    #[serde(rename = "Market_Cap")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Volume_24h")]
    pub volume_24h: f64,
    /// Always undefined: the series is daily.
    #[serde(rename = "Percent_Change_1h")]
    pub percent_change_1h: Option<f64>,
    #[serde(rename = "Percent_Change_24h")]
    pub percent_change_24h: Option<f64>,
    #[serde(rename = "Percent_Change_7d")]
    pub percent_change_7d: Option<f64>,
    #[serde(rename = "Percent_Change_30d")]
    pub percent_change_30d: Option<f64>,
    #[serde(rename = "SMA_20")]
    pub sma_20: Option<f64>,
    #[serde(rename = "SMA_50")]
    pub sma_50: Option<f64>,
    #[serde(rename = "EMA_20")]
    pub ema_20: Option<f64>,
    #[serde(rename = "EMA_50")]
    pub ema_50: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "MACD_Signal")]
    pub macd_signal: Option<f64>,
    #[serde(rename = "OBV")]
    pub obv: Option<f64>,
}

impl IndicatorRow {
    /// True if at least one technical column is defined.
    pub fn has_technical_value(&self) -> bool {
        [
            self.sma_20,
            self.sma_50,
            self.ema_20,
            self.ema_50,
            self.rsi,
            self.macd,
            self.macd_signal,
            self.obv,
        ]
        .iter()
        .any(Option::is_some)
    }
}

/// Window sizes actually used for a series of `len` points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Windows {
    pub sma: usize,
    pub sma_large: usize,
    pub rsi: usize,
}

impl Windows {
    pub fn for_len(len: usize) -> Self {
        let available = len.saturating_sub(1);
        Self {
            sma: SMA_WINDOW.min(available),
            sma_large: SMA_WINDOW_LARGE.min(available),
            rsi: RSI_WINDOW.min(available),
        }
    }
}

/// Compute the indicator table for `series`.
///
/// Series shorter than two points produce an empty table. Rows whose eight
/// technical columns are all undefined are dropped.
pub fn compute(series: &Series) -> Result<Vec<IndicatorRow>, DeepcoinError> {
    if series.is_empty() {
        return Err(DeepcoinError::data_unavailable("empty price series"));
    }
    if series.len() < 2 {
        return Ok(Vec::new());
    }

    let prices = series.prices();
    let volumes = series.volumes_or_zero();
    let windows = Windows::for_len(series.len());

    let pct_24h = calculate_roc(&prices, LAG_24H);
    let pct_7d = calculate_roc(&prices, LAG_7D);
    let pct_30d = calculate_roc(&prices, LAG_30D);
    let sma_20 = calculate_sma(&prices, windows.sma);
    let sma_50 = calculate_sma(&prices, windows.sma_large);
    let ema_20 = calculate_ema(&prices, windows.sma);
    let ema_50 = calculate_ema(&prices, windows.sma_large);
    let rsi = calculate_rsi(&prices, windows.rsi);
    let macd = calculate_macd_default(&prices);
    let obv = calculate_obv(&prices, &volumes);

    let at = |s: &IndicatorSeries, i: usize| s.get(i).filter(|v| v.is_finite());

    let rows = series
        .points()
        .iter()
        .enumerate()
        .map(|(i, point)| IndicatorRow {
            timestamp: point.timestamp,
            price: point.price,
            market_cap: point.market_cap.filter(|v| v.is_finite()),
            volume_24h: volumes[i],
            percent_change_1h: None,
            percent_change_24h: at(&pct_24h, i),
            percent_change_7d: at(&pct_7d, i),
            percent_change_30d: at(&pct_30d, i),
            sma_20: at(&sma_20, i),
            sma_50: at(&sma_50, i),
            ema_20: at(&ema_20, i),
            ema_50: at(&ema_50, i),
            rsi: at(&rsi, i),
            macd: at(&macd.line, i),
            macd_signal: at(&macd.signal, i),
            obv: at(&obv, i),
        })
        .filter(IndicatorRow::has_technical_value)
        .collect();

    Ok(rows)
}
