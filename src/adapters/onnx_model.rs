//! ONNX Runtime forecast model.
//!
//! The pretrained network is exported to ONNX and run through `ort` when the
//! `onnx` feature is enabled. It takes a `[1, 365, 1]` f32 tensor of
//! normalized log-returns and emits at least seven normalized returns; only
//! the first seven are used.
//!
//! Without the feature the loader always reports the model as unavailable,
//! and forecast requests degrade to an error result.

use std::path::PathBuf;

use crate::domain::settings::Settings;

#[cfg(not(feature = "onnx"))]
use crate::domain::error::DeepcoinError;
#[cfg(not(feature = "onnx"))]
use crate::ports::model_port::{ForecastModel, ModelLoader};
#[cfg(not(feature = "onnx"))]
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct OnnxModelConfig {
    pub model_path: PathBuf,
    pub input_name: String,
}

impl OnnxModelConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            model_path: settings.model_path.clone(),
            input_name: settings.model_input_name.clone(),
        }
    }
}

pub struct OnnxModelLoader {
    config: OnnxModelConfig,
}

impl OnnxModelLoader {
    pub fn new(config: OnnxModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OnnxModelConfig {
        &self.config
    }
}

#[cfg(not(feature = "onnx"))]
impl ModelLoader for OnnxModelLoader {
    fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
        Err(DeepcoinError::model_unavailable(format!(
            "cannot load {}: built without onnx support",
            self.config.model_path.display()
        )))
    }
}

#[cfg(feature = "onnx")]
pub use runtime::OnnxForecastModel;

#[cfg(feature = "onnx")]
mod runtime {
    use std::sync::{Arc, Mutex};

    use ort::session::builder::GraphOptimizationLevel;
    use ort::session::Session;
    use tracing::{debug, info};

    use super::{OnnxModelLoader, OnnxModelConfig};
    use crate::domain::error::DeepcoinError;
    use crate::domain::reconstruct::HORIZON;
    use crate::domain::returns::INPUT_WINDOW;
    use crate::ports::model_port::{ForecastModel, ModelLoader};

    /// Loaded session. `ort` needs exclusive access to run, so calls are
    /// serialized; weights are never written.
    pub struct OnnxForecastModel {
        session: Mutex<Session>,
        input_name: String,
    }

    impl ModelLoader for OnnxModelLoader {
        fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
            let model = OnnxForecastModel::load(self.config())?;
            Ok(Arc::new(model))
        }
    }

    impl OnnxForecastModel {
        pub fn load(config: &OnnxModelConfig) -> Result<Self, DeepcoinError> {
            let path = &config.model_path;
            if !path.exists() {
                return Err(DeepcoinError::model_unavailable(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }

            info!("loading ONNX model from {}", path.display());

            let session = Session::builder()
                .map_err(|e| {
                    DeepcoinError::model_unavailable(format!("failed to create session builder: {}", e))
                })?
                .with_optimization_level(GraphOptimizationLevel::Level3)
                .map_err(|e| {
                    DeepcoinError::model_unavailable(format!("failed to set optimization level: {}", e))
                })?
                .commit_from_file(path)
                .map_err(|e| DeepcoinError::model_unavailable(format!("failed to load model: {}", e)))?;

            Ok(Self {
                session: Mutex::new(session),
                input_name: config.input_name.clone(),
            })
        }
    }

    impl ForecastModel for OnnxForecastModel {
        fn predict(
            &self,
            window: &[f64; INPUT_WINDOW],
        ) -> Result<[f64; HORIZON], DeepcoinError> {
            let input: Vec<f32> = window.iter().map(|&v| v as f32).collect();
            let shape = [1i64, INPUT_WINDOW as i64, 1];

            let tensor = ort::value::Tensor::from_array((shape, input.into_boxed_slice()))
                .map_err(|e| DeepcoinError::computation(format!("failed to create input tensor: {}", e)))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| DeepcoinError::computation("model session lock poisoned"))?;

            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => tensor])
                .map_err(|e| DeepcoinError::computation(format!("inference failed: {}", e)))?;

            let (_, output) = outputs
                .iter()
                .next()
                .ok_or_else(|| DeepcoinError::computation("no output tensor found"))?;

            let (_, values) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| DeepcoinError::computation(format!("failed to extract output: {}", e)))?;

            if values.len() < HORIZON {
                return Err(DeepcoinError::computation(format!(
                    "expected {} output values, got {}",
                    HORIZON,
                    values.len()
                )));
            }

            let mut out = [0.0; HORIZON];
            for (slot, &v) in out.iter_mut().zip(values) {
                *slot = v as f64;
            }
            debug!(?out, "model prediction");
            Ok(out)
        }
    }
}
