//! Daily price/volume observations and the validated series built from them.

use chrono::{DateTime, Utc};

use crate::domain::error::DeepcoinError;

#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
}

/// Non-empty, strictly time-ordered sequence of daily points.
#[derive(Debug, Clone)]
pub struct Series {
    points: Vec<PricePoint>,
}

impl Series {
    /// Validate upstream points into a series.
    ///
    /// Rejects empty input, non-increasing timestamps and non-finite prices
    /// with `DataUnavailable`; a malformed series never reaches the pipelines.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, DeepcoinError> {
        if points.is_empty() {
            return Err(DeepcoinError::data_unavailable("empty price series"));
        }
        for (i, point) in points.iter().enumerate() {
            if !point.price.is_finite() {
                return Err(DeepcoinError::data_unavailable(format!(
                    "non-finite price at {}",
                    point.timestamp.to_rfc3339()
                )));
            }
            if i > 0 && point.timestamp <= points[i - 1].timestamp {
                return Err(DeepcoinError::data_unavailable(format!(
                    "timestamps not strictly increasing at {}",
                    point.timestamp.to_rfc3339()
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Volumes with missing values read as zero.
    pub fn volumes_or_zero(&self) -> Vec<f64> {
        self.points
            .iter()
            .map(|p| p.volume_24h.unwrap_or(0.0))
            .collect()
    }

    pub fn last(&self) -> &PricePoint {
        // Non-empty by construction.
        &self.points[self.points.len() - 1]
    }
}
