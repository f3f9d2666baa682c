//! Forecast assembly: recent history followed by the reconstructed week.

use crate::domain::error::DeepcoinError;
use crate::domain::model_handle::ModelHandle;
use crate::domain::price_point::Series;
use crate::domain::reconstruct::{future_points, reconstruct, ForecastPoint};
use crate::domain::returns::normalize;

/// Historical days echoed ahead of the forecast.
pub const HISTORY_TAIL: usize = 100;

/// The last `HISTORY_TAIL` observations as dated points.
pub fn history_points(series: &Series) -> Vec<ForecastPoint> {
    let points = series.points();
    let start = points.len().saturating_sub(HISTORY_TAIL);
    points[start..]
        .iter()
        .map(|p| ForecastPoint {
            date: p.timestamp.date_naive(),
            price: p.price,
        })
        .collect()
}

/// Run normalization, inference and reconstruction for `series`.
///
/// The model is only touched once the series has passed the history check.
pub async fn forecast(
    series: &Series,
    model: &ModelHandle,
) -> Result<Vec<ForecastPoint>, DeepcoinError> {
    let window = normalize(series)?;
    let predicted = model.predict(&window.values).await?;

    let last = series.last();
    let prices = reconstruct(last.price, &predicted, window.mean, window.std)?;

    let mut out = history_points(series);
    out.extend(future_points(last.timestamp.date_naive(), &prices));
    Ok(out)
}
