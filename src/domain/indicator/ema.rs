//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1). Recursive smoothing seeded with the first price:
//! EMA[0] = C[0], EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) points are undefined even though the recursion runs
//! through them.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_ema(prices: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values: ema_values(prices, period),
    }
}

/// Raw EMA over a contiguous slice, shared with MACD.
pub(crate) fn ema_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;

    for (i, &value) in values.iter().enumerate() {
        ema = if i == 0 { value } else { value * k + ema * (1.0 - k) };
        out.push(if i + 1 >= period { Some(ema) } else { None });
    }

    out
}
