//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow), defined once both EMAs are.
//! Signal Line = EMA(signal) of the MACD line, seeded at its first defined
//! point.
//!
//! Default parameters: fast=12, slow=26, signal=9. Windows are never shrunk
//! for short input; a series shorter than `slow` yields no MACD at all.
//! Warmup: line from index max(fast, slow) - 1, signal `signal - 1` later.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
}

pub fn calculate_macd(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let line_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    let signal_type = IndicatorType::MacdSignal {
        fast,
        slow,
        signal: signal_period,
    };

    if fast == 0 || slow == 0 || signal_period == 0 {
        return MacdSeries {
            line: IndicatorSeries::undefined(line_type, prices.len()),
            signal: IndicatorSeries::undefined(signal_type, prices.len()),
        };
    }

    let ema_fast = ema_values(prices, fast);
    let ema_slow = ema_values(prices, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let mut signal = vec![None; prices.len()];
    if let Some(start) = line.iter().position(Option::is_some) {
        let defined: Vec<f64> = line[start..].iter().map(|v| v.unwrap_or(0.0)).collect();
        for (offset, value) in ema_values(&defined, signal_period).into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    MacdSeries {
        line: IndicatorSeries {
            indicator_type: line_type,
            values: line,
        },
        signal: IndicatorSeries {
            indicator_type: signal_type,
            values: signal,
        },
    }
}

pub fn calculate_macd_default(prices: &[f64]) -> MacdSeries {
    calculate_macd(prices, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL)
}
