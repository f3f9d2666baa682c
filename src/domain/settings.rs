//! Runtime settings read from configuration, with validation.
//!
//! Every key is optional; an empty configuration yields the defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::error::DeepcoinError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    CoinGecko,
    Csv,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_source: DataSource,
    pub base_url: String,
    pub vs_currency: String,
    pub history_days: u32,
    pub csv_dir: PathBuf,
    pub fetch_timeout: Duration,
    pub model_path: PathBuf,
    pub model_input_name: String,
    pub model_load_timeout: Duration,
    pub listen: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_source: DataSource::CoinGecko,
            base_url: DEFAULT_BASE_URL.to_string(),
            vs_currency: "usd".to_string(),
            history_days: 365,
            csv_dir: PathBuf::from("data"),
            fetch_timeout: Duration::from_secs(30),
            model_path: PathBuf::from("model/price_predictor.onnx"),
            model_input_name: "input".to_string(),
            model_load_timeout: Duration::from_secs(120),
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, DeepcoinError> {
        let defaults = Settings::default();

        let data_source = match config.get_string("data", "source").as_deref() {
            None | Some("coingecko") => DataSource::CoinGecko,
            Some("csv") => DataSource::Csv,
            Some(other) => {
                return Err(invalid(
                    "data",
                    "source",
                    format!("unknown source '{other}', expected coingecko or csv"),
                ));
            }
        };

        let history_days = config.get_int("data", "days", defaults.history_days as i64);
        if history_days <= 0 || history_days > u32::MAX as i64 {
            return Err(invalid("data", "days", "days must be positive"));
        }

        Ok(Self {
            data_source,
            base_url: config
                .get_string("data", "base_url")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            vs_currency: config
                .get_string("data", "vs_currency")
                .unwrap_or(defaults.vs_currency),
            history_days: history_days as u32,
            csv_dir: config
                .get_string("data", "csv_dir")
                .map(PathBuf::from)
                .unwrap_or(defaults.csv_dir),
            fetch_timeout: timeout_secs(config, "data", "fetch_timeout_secs", defaults.fetch_timeout)?,
            model_path: config
                .get_string("model", "path")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            model_input_name: config
                .get_string("model", "input_name")
                .unwrap_or(defaults.model_input_name),
            model_load_timeout: timeout_secs(
                config,
                "model",
                "load_timeout_secs",
                defaults.model_load_timeout,
            )?,
            listen: config.get_string("web", "listen").unwrap_or(defaults.listen),
        })
    }
}

fn timeout_secs(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Duration,
) -> Result<Duration, DeepcoinError> {
    let secs = config.get_double(section, key, default.as_secs_f64());
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid(section, key, format!("{key} must be positive")));
    }
    Ok(Duration::from_secs_f64(secs))
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DeepcoinError {
    DeepcoinError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
