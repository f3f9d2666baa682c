//! Owning handle around the lazily-loaded forecast model.
//!
//! The first prediction triggers the load; every later call reuses the same
//! instance. A failed load leaves the handle empty, so the next request tries
//! again instead of being wedged. A load that outlives `load_timeout` keeps
//! running on the blocking pool; later requests wait on that same load rather
//! than starting another one.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::error::DeepcoinError;
use crate::domain::reconstruct::HORIZON;
use crate::domain::returns::INPUT_WINDOW;
use crate::ports::model_port::{ForecastModel, ModelLoader};

type LoadTask = JoinHandle<Result<Arc<dyn ForecastModel>, DeepcoinError>>;

pub struct ModelHandle {
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn ForecastModel>>,
    in_flight: Mutex<Option<LoadTask>>,
    load_timeout: Duration,
}

impl ModelHandle {
    pub fn new(loader: Arc<dyn ModelLoader>, load_timeout: Duration) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
            in_flight: Mutex::new(None),
            load_timeout,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// The loaded model, loading it first if needed.
    ///
    /// Concurrent first callers wait on a single load.
    pub async fn get(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
        let model = self
            .model
            .get_or_try_init(|| self.load())
            .await?;
        Ok(Arc::clone(model))
    }

    /// Run inference on the blocking pool.
    pub async fn predict(
        &self,
        window: &[f64; INPUT_WINDOW],
    ) -> Result<[f64; HORIZON], DeepcoinError> {
        let model = self.get().await?;
        let window = *window;
        tokio::task::spawn_blocking(move || model.predict(&window))
            .await
            .map_err(|e| DeepcoinError::computation(format!("inference task failed: {e}")))?
    }

    async fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
        let mut in_flight = self.in_flight.lock().await;
        let task = in_flight.get_or_insert_with(|| {
            info!("loading forecast model");
            let loader = Arc::clone(&self.loader);
            tokio::task::spawn_blocking(move || loader.load())
        });

        let waited = tokio::time::timeout(self.load_timeout, task).await;
        let result = match waited {
            Ok(joined) => {
                *in_flight = None;
                match joined {
                    Ok(loaded) => loaded,
                    Err(join) => Err(DeepcoinError::model_unavailable(format!(
                        "model load aborted: {join}"
                    ))),
                }
            }
            // The task stays in `in_flight` for the next caller to await.
            Err(_) => Err(DeepcoinError::model_unavailable(format!(
                "model load timed out after {}s",
                self.load_timeout.as_secs_f64()
            ))),
        };

        match &result {
            Ok(_) => info!("forecast model ready"),
            Err(e) => warn!(error = %e, "forecast model failed to load"),
        }
        result
    }
}
