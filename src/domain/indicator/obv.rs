//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::indicator::{IndicatorSeries, IndicatorType};

/// Calculate OBV (On-Balance Volume) indicator.
///
/// OBV[0] = 0
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// Volumes must already have missing values replaced by zero. No warmup;
/// every point is defined.
pub fn calculate_obv(prices: &[f64], volumes: &[f64]) -> IndicatorSeries {
    let mut values = Vec::with_capacity(prices.len());
    let mut obv = 0.0;

    for i in 0..prices.len() {
        if i > 0 {
            let volume = volumes.get(i).copied().unwrap_or(0.0);
            if prices[i] > prices[i - 1] {
                obv += volume;
            } else if prices[i] < prices[i - 1] {
                obv -= volume;
            }
        }
        values.push(Some(obv));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Obv,
        values,
    }
}
