//! ROC (Rate of Change) indicator implementation.
//!
//! ROC(n)[i] = ((C[i] - C[i-n]) / C[i-n]) * 100
//! Undefined when C[i-n] == 0.
//! Warmup: first n points undefined.

use crate::domain::indicator::{finite, IndicatorSeries, IndicatorType};

pub fn calculate_roc(prices: &[f64], period: usize) -> IndicatorSeries {
    let values = (0..prices.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let prev = prices[i - period];
            if prev == 0.0 {
                return None;
            }
            finite((prices[i] - prev) / prev * 100.0)
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Roc(period),
        values,
    }
}
