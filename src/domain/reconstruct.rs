//! Price path reconstruction from predicted normalized log-returns.
//!
//! Returns compound multiplicatively: p[0] = last * exp(r[0]),
//! p[i] = p[i-1] * exp(r[i]). No floor or cap is applied to the path.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::domain::error::DeepcoinError;
use crate::domain::returns::denormalize;

/// Days forecast past the last observation.
pub const HORIZON: usize = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Walk denormalized returns forward from `last_price`.
pub fn reconstruct(
    last_price: f64,
    normalized_returns: &[f64; HORIZON],
    mean: f64,
    std: f64,
) -> Result<[f64; HORIZON], DeepcoinError> {
    let mut prices = [0.0; HORIZON];
    let mut price = last_price;

    for (slot, &normalized) in prices.iter_mut().zip(normalized_returns) {
        price *= denormalize(normalized, mean, std).exp();
        if !price.is_finite() {
            return Err(DeepcoinError::computation("reconstructed price is not finite"));
        }
        *slot = price;
    }

    Ok(prices)
}

/// Pair reconstructed prices with the calendar days after `last_date`.
pub fn future_points(last_date: NaiveDate, prices: &[f64; HORIZON]) -> Vec<ForecastPoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| ForecastPoint {
            date: last_date + Duration::days(i as i64 + 1),
            price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_returns_hold_last_price() {
        let prices = reconstruct(100.0, &[0.0; HORIZON], 0.0, 1.0).unwrap();
        for p in prices {
            assert_relative_eq!(p, 100.0);
        }
    }

    #[test]
    fn normalized_mean_maps_to_zero_return() {
        // normalized value -mean/std denormalizes to exactly zero
        let mean = 0.002;
        let std = 0.04;
        let prices = reconstruct(250.0, &[-mean / std; HORIZON], mean, std).unwrap();
        for p in prices {
            assert_relative_eq!(p, 250.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn golden_path_compounds() {
        let returns = [0.01, -0.02, 0.0, 0.03, 0.01, -0.01, 0.02];
        let prices = reconstruct(100.0, &returns, 0.0, 1.0).unwrap();

        let expected = [
            101.005017, 99.004983, 99.004983, 102.020134, 103.045453, 102.020134, 104.081077,
        ];
        for (p, e) in prices.iter().zip(expected) {
            assert_relative_eq!(*p, e, epsilon = 1e-5);
        }
    }

    #[test]
    fn compounding_is_not_additive() {
        let returns = [0.5; HORIZON];
        let prices = reconstruct(10.0, &returns, 0.0, 1.0).unwrap();
        let additive = 10.0 * (1.0 + 0.5 * HORIZON as f64);
        let compounded = 10.0 * (0.5 * HORIZON as f64).exp();
        assert_relative_eq!(prices[HORIZON - 1], compounded, max_relative = 1e-12);
        assert!((prices[HORIZON - 1] - additive).abs() > 1.0);
    }

    #[test]
    fn denormalizes_with_given_statistics() {
        let mut returns = [0.0; HORIZON];
        returns[0] = 1.0;
        let prices = reconstruct(100.0, &returns, 0.01, 0.02).unwrap();
        assert_relative_eq!(prices[0], 100.0 * (0.03f64).exp(), epsilon = 1e-9);
        assert_relative_eq!(prices[1], prices[0] * (0.01f64).exp(), epsilon = 1e-9);
    }

    #[test]
    fn overflow_is_a_computation_error() {
        let err = reconstruct(1e300, &[1000.0; HORIZON], 0.0, 1.0).unwrap_err();
        assert!(matches!(err, DeepcoinError::Computation { .. }));
    }

    #[test]
    fn future_dates_are_consecutive_days() {
        let last = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let points = future_points(last, &[1.0; HORIZON]);
        assert_eq!(points.len(), HORIZON);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!(points[1].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(points[6].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }
}
