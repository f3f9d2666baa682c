//! Log-return normalization.
//!
//! Statistics are computed per request over the model window only. The same
//! `(mean, std)` pair must be used to denormalize the model's output; it is
//! never recomputed from predictions.

use crate::domain::error::DeepcoinError;
use crate::domain::indicator::stddev::{mean, population_stddev};
use crate::domain::price_point::Series;

/// Number of log-returns the model consumes.
pub const INPUT_WINDOW: usize = 365;
/// Price points needed to produce `INPUT_WINDOW` returns.
pub const MIN_FORECAST_POINTS: usize = INPUT_WINDOW + 1;
/// Floor added to the standard deviation of constant returns.
pub const STD_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone)]
pub struct NormalizedReturnWindow {
    pub values: [f64; INPUT_WINDOW],
    pub mean: f64,
    pub std: f64,
}

impl NormalizedReturnWindow {
    pub fn denormalize(&self, normalized: f64) -> f64 {
        denormalize(normalized, self.mean, self.std)
    }
}

/// ln(p[t]) - ln(p[t-1]) over the whole slice.
pub fn log_returns(prices: &[f64]) -> Result<Vec<f64>, DeepcoinError> {
    if let Some(bad) = prices.iter().find(|p| **p <= 0.0 || !p.is_finite()) {
        return Err(DeepcoinError::computation(format!(
            "cannot take log of price {bad}"
        )));
    }
    Ok(prices.windows(2).map(|w| w[1].ln() - w[0].ln()).collect())
}

/// Normalize the most recent `INPUT_WINDOW` log-returns of `series`.
pub fn normalize(series: &Series) -> Result<NormalizedReturnWindow, DeepcoinError> {
    if series.len() < MIN_FORECAST_POINTS {
        return Err(DeepcoinError::InsufficientHistory {
            points: series.len(),
            minimum: MIN_FORECAST_POINTS,
        });
    }

    let returns = log_returns(&series.prices())?;
    let recent = &returns[returns.len() - INPUT_WINDOW..];

    let mean = mean(recent).ok_or_else(|| DeepcoinError::computation("empty return window"))?;
    let std = population_stddev(recent)
        .ok_or_else(|| DeepcoinError::computation("empty return window"))?
        + STD_EPSILON;

    if !mean.is_finite() || !std.is_finite() {
        return Err(DeepcoinError::computation("non-finite return statistics"));
    }

    let mut values = [0.0; INPUT_WINDOW];
    for (slot, r) in values.iter_mut().zip(recent) {
        *slot = (r - mean) / std;
    }

    Ok(NormalizedReturnWindow { values, mean, std })
}

pub fn denormalize(normalized: f64, mean: f64, std: f64) -> f64 {
    normalized * std + mean
}
