//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::coingecko_adapter::CoinGeckoAdapter;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_cache::MemoizeForever;
use crate::adapters::onnx_model::{OnnxModelConfig, OnnxModelLoader};
use crate::domain::error::{error_body, DeepcoinError};
use crate::domain::model_handle::ModelHandle;
use crate::domain::pipeline::{CacheKey, PipelineKind, PipelineOrchestrator};
use crate::domain::settings::{DataSource, Settings};
use crate::ports::market_data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(name = "deepcoin", about = "Crypto technical indicators and price forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the indicator table for a coin as JSON
    Indicators {
        coin: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the 100-day history and 7-day forecast for a coin as JSON
    Forecast {
        coin: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Start the HTTP server
    Serve {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Install the global subscriber. Logs go to stderr; stdout carries results.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Indicators { coin, config } => {
            run_pipeline(config.as_deref(), &coin, PipelineKind::Indicators)
        }
        Command::Forecast { coin, config } => {
            run_pipeline(config.as_deref(), &coin, PipelineKind::Forecast)
        }
        Command::Serve { config } => run_serve(config.as_deref()),
    }
}

/// Settings from `path`, or the defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, DeepcoinError> {
    match path {
        Some(path) => {
            let config = FileConfigAdapter::from_file(path)?;
            Settings::from_config(&config)
        }
        None => Ok(Settings::default()),
    }
}

pub fn build_orchestrator(settings: &Settings) -> Result<PipelineOrchestrator, DeepcoinError> {
    let market_data: Arc<dyn MarketDataPort> = match settings.data_source {
        DataSource::CoinGecko => Arc::new(CoinGeckoAdapter::from_settings(settings)?),
        DataSource::Csv => Arc::new(CsvAdapter::new(settings.csv_dir.clone())),
    };
    let loader = OnnxModelLoader::new(OnnxModelConfig::from_settings(settings));
    let model = ModelHandle::new(Arc::new(loader), settings.model_load_timeout);

    Ok(PipelineOrchestrator::new(
        market_data,
        model,
        Arc::new(MemoizeForever::<CacheKey, String>::new()),
        settings.fetch_timeout,
    ))
}

/// Run one pipeline to completion and return its serialized result.
pub async fn pipeline_output(
    config_path: Option<&Path>,
    coin: &str,
    kind: PipelineKind,
) -> Result<String, DeepcoinError> {
    let settings = load_settings(config_path)?;
    let orchestrator = build_orchestrator(&settings)?;
    orchestrator.get_or_compute(coin, kind).await
}

fn run_pipeline(config_path: Option<&Path>, coin: &str, kind: PipelineKind) -> ExitCode {
    let result = tokio::runtime::Runtime::new()
        .map_err(DeepcoinError::from)
        .and_then(|rt| rt.block_on(pipeline_output(config_path, coin, kind)));

    match result {
        Ok(body) => {
            println!("{body}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", error_body(&err));
            ExitCode::from(&err)
        }
    }
}

fn run_serve(config_path: Option<&Path>) -> ExitCode {
    #[cfg(feature = "web")]
    {
        use crate::adapters::web::{serve, AppState};

        let result = load_settings(config_path).and_then(|settings| {
            let orchestrator = build_orchestrator(&settings)?;
            let state = AppState {
                orchestrator: Arc::new(orchestrator),
            };
            info!(listen = %settings.listen, "starting web server");
            tokio::runtime::Runtime::new()?.block_on(serve(&settings.listen, state))
        });

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: {err}");
                ExitCode::from(&err)
            }
        }
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = config_path;
        info!("serve requested without web support");
        eprintln!("error: web feature is required for serve");
        ExitCode::from(1)
    }
}
