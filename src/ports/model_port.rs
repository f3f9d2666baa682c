//! Forecast model port traits.

use std::sync::Arc;

use crate::domain::error::DeepcoinError;
use crate::domain::reconstruct::HORIZON;
use crate::domain::returns::INPUT_WINDOW;

/// Pretrained sequence predictor: normalized log-returns in, normalized
/// log-returns out. Inference never mutates model weights.
pub trait ForecastModel: Send + Sync {
    fn predict(&self, window: &[f64; INPUT_WINDOW]) -> Result<[f64; HORIZON], DeepcoinError>;
}

/// Produces a ready model. Called at most once per successful load.
pub trait ModelLoader: Send + Sync {
    /// Load the model artifact; failures map to `ModelUnavailable`.
    fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError>;
}
