//! RSI (Relative Strength Index) indicator implementation.
//!
//! Up/down moves are C[i] - C[i-1] split by sign; the move into the first
//! point counts as zero. Both are smoothed with Wilder's recursion
//! (alpha = 1/n, seeded with the first move):
//!   avg[i] = avg[i-1] + (move[i] - avg[i-1]) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first (n-1) points are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub fn calculate_rsi(prices: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 || prices.len() < 2 {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), prices.len());
    }

    let alpha = 1.0 / period as f64;
    let mut values = Vec::with_capacity(prices.len());
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 0..prices.len() {
        let change = if i == 0 { 0.0 } else { prices[i] - prices[i - 1] };
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if i == 0 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain += alpha * (gain - avg_gain);
            avg_loss += alpha * (loss - avg_loss);
        }

        if i + 1 < period {
            values.push(None);
            continue;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        values.push(Some(rsi));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
