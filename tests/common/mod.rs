#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use deepcoin::adapters::memory_cache::MemoizeForever;
use deepcoin::domain::error::DeepcoinError;
use deepcoin::domain::model_handle::ModelHandle;
use deepcoin::domain::pipeline::{CacheKey, PipelineOrchestrator};
pub use deepcoin::domain::price_point::{PricePoint, Series};
use deepcoin::domain::reconstruct::HORIZON;
use deepcoin::domain::returns::INPUT_WINDOW;
use deepcoin::ports::market_data_port::MarketDataPort;
use deepcoin::ports::model_port::{ForecastModel, ModelLoader};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct MockMarketData {
    pub data: HashMap<String, Series>,
    pub errors: HashMap<String, String>,
    pub fetches: AtomicUsize,
    pub delay: Option<Duration>,
    /// Fail this many initial fetches before serving data.
    pub fail_first: usize,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            fetches: AtomicUsize::new(0),
            delay: None,
            fail_first: 0,
        }
    }

    pub fn with_series(mut self, asset: &str, series: Series) -> Self {
        self.data.insert(asset.to_string(), series);
        self
    }

    pub fn with_error(mut self, asset: &str, reason: &str) -> Self {
        self.errors.insert(asset.to_string(), reason.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_daily_series(&self, asset_id: &str) -> Result<Series, DeepcoinError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if n < self.fail_first {
            return Err(DeepcoinError::data_unavailable("upstream hiccup"));
        }
        if let Some(reason) = self.errors.get(asset_id) {
            return Err(DeepcoinError::data_unavailable(reason.clone()));
        }
        self.data
            .get(asset_id)
            .cloned()
            .ok_or_else(|| DeepcoinError::data_unavailable(format!("unknown asset {asset_id}")))
    }
}

/// Predicts a constant normalized return for every horizon day.
pub struct ConstantModel(pub f64);

impl ForecastModel for ConstantModel {
    fn predict(&self, _window: &[f64; INPUT_WINDOW]) -> Result<[f64; HORIZON], DeepcoinError> {
        Ok([self.0; HORIZON])
    }
}

pub struct MockLoader {
    pub loads: AtomicUsize,
    pub available: bool,
    pub output: f64,
}

impl MockLoader {
    pub fn ready(output: f64) -> Self {
        Self {
            loads: AtomicUsize::new(0),
            available: true,
            output,
        }
    }

    pub fn missing() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            available: false,
            output: 0.0,
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for MockLoader {
    fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.available {
            return Err(DeepcoinError::model_unavailable("model artifact not found"));
        }
        Ok(Arc::new(ConstantModel(self.output)))
    }
}

/// Loader that blocks until `release` is called, recording overlapping loads.
pub struct SlowLoader {
    released: AtomicBool,
    loads: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl SlowLoader {
    pub fn new() -> Self {
        Self {
            released: AtomicBool::new(false),
            loads: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn release(&self) {
        self.released.store(true, Ordering::SeqCst);
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl ModelLoader for SlowLoader {
    fn load(&self) -> Result<Arc<dyn ForecastModel>, DeepcoinError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        while !self.released.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(5));
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Arc::new(ConstantModel(0.0)))
    }
}

/// Daily series starting 2024-01-01 with prices from `price_at(i)`.
pub fn generate_series(len: usize, price_at: impl Fn(usize) -> f64) -> Series {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let points = (0..len)
        .map(|i| PricePoint {
            timestamp: start + ChronoDuration::days(i as i64),
            price: price_at(i),
            market_cap: Some(price_at(i) * 19_000_000.0),
            volume_24h: Some(1_000.0 + (i % 7) as f64 * 100.0),
        })
        .collect();
    Series::new(points).unwrap()
}

/// Gently oscillating uptrend, strictly positive.
pub fn wave_series(len: usize) -> Series {
    generate_series(len, |i| 100.0 + i as f64 * 0.1 + (i as f64 * 0.7).sin() * 3.0)
}

pub fn orchestrator(
    market_data: Arc<MockMarketData>,
    loader: Arc<MockLoader>,
) -> PipelineOrchestrator {
    PipelineOrchestrator::new(
        market_data,
        ModelHandle::new(loader, Duration::from_secs(5)),
        Arc::new(MemoizeForever::<CacheKey, String>::new()),
        Duration::from_secs(5),
    )
}
