//! Pipeline orchestration with per-asset memoization.
//!
//! Finished results are memoized forever: once an `(asset, kind)` pair has a
//! serialized result, later requests get exactly that body even if upstream
//! data has moved on. There is no expiry and no invalidation. Failures are
//! never stored, so a failing request stays retryable.
//!
//! Concurrent misses on the same key are collapsed: one caller computes while
//! the others wait on the key's gate and then read the cache. Gates are
//! dropped once no caller needs them, so unknown or failing ids leave nothing
//! behind.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::error::DeepcoinError;
use crate::domain::forecast::forecast;
use crate::domain::indicator_engine;
use crate::domain::model_handle::ModelHandle;
use crate::domain::price_point::Series;
use crate::ports::cache_port::ResultCache;
use crate::ports::market_data_port::MarketDataPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Indicators,
    Forecast,
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineKind::Indicators => write!(f, "indicators"),
            PipelineKind::Forecast => write!(f, "forecast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub asset_id: String,
    pub kind: PipelineKind,
}

impl CacheKey {
    pub fn new(asset_id: &str, kind: PipelineKind) -> Self {
        Self {
            asset_id: normalize_asset_id(asset_id),
            kind,
        }
    }
}

/// Asset ids are matched case-insensitively and without surrounding space.
pub fn normalize_asset_id(asset_id: &str) -> String {
    asset_id.trim().to_lowercase()
}

type Gate = Arc<tokio::sync::Mutex<()>>;

/// A caller's hold on a key's gate. Gates only exist while some caller holds
/// or waits on them; the last lease out removes the entry.
struct GateLease<'a> {
    orchestrator: &'a PipelineOrchestrator,
    key: CacheKey,
    gate: Gate,
}

impl Drop for GateLease<'_> {
    fn drop(&mut self) {
        let mut gates = self.orchestrator.lock_gates();
        let last = Arc::strong_count(&self.gate) == 2;
        if last && gates.get(&self.key).is_some_and(|g| Arc::ptr_eq(g, &self.gate)) {
            gates.remove(&self.key);
        }
    }
}

pub struct PipelineOrchestrator {
    market_data: Arc<dyn MarketDataPort>,
    model: ModelHandle,
    cache: Arc<dyn ResultCache<CacheKey, String>>,
    gates: Mutex<HashMap<CacheKey, Gate>>,
    fetch_timeout: Duration,
}

impl PipelineOrchestrator {
    pub fn new(
        market_data: Arc<dyn MarketDataPort>,
        model: ModelHandle,
        cache: Arc<dyn ResultCache<CacheKey, String>>,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            market_data,
            model,
            cache,
            gates: Mutex::new(HashMap::new()),
            fetch_timeout,
        }
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Serialized result for `(asset_id, kind)`, computing it on a miss.
    pub async fn get_or_compute(
        &self,
        asset_id: &str,
        kind: PipelineKind,
    ) -> Result<String, DeepcoinError> {
        let key = CacheKey::new(asset_id, kind);
        if key.asset_id.is_empty() {
            return Err(DeepcoinError::data_unavailable("empty asset id"));
        }

        if let Some(hit) = self.cache.get(&key) {
            debug!(asset = %key.asset_id, %kind, "cache hit");
            return Ok(hit);
        }

        let lease = self.lease_gate(&key);
        let _held = lease.gate.lock().await;

        // Another caller may have finished while we waited.
        if let Some(hit) = self.cache.get(&key) {
            debug!(asset = %key.asset_id, %kind, "cache filled while waiting");
            return Ok(hit);
        }

        info!(asset = %key.asset_id, %kind, "cache miss, computing");
        match self.compute(&key).await {
            Ok(body) => {
                self.cache.put(key, body.clone());
                Ok(body)
            }
            Err(e) => {
                warn!(asset = %key.asset_id, %kind, error = %e, "pipeline failed");
                Err(e)
            }
        }
    }

    fn lock_gates(&self) -> MutexGuard<'_, HashMap<CacheKey, Gate>> {
        match self.gates.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn lease_gate(&self, key: &CacheKey) -> GateLease<'_> {
        let gate = Arc::clone(self.lock_gates().entry(key.clone()).or_default());
        GateLease {
            orchestrator: self,
            key: key.clone(),
            gate,
        }
    }

    async fn compute(&self, key: &CacheKey) -> Result<String, DeepcoinError> {
        let series = self.fetch(&key.asset_id).await?;
        match key.kind {
            PipelineKind::Indicators => {
                let rows = indicator_engine::compute(&series)?;
                to_json(&rows)
            }
            PipelineKind::Forecast => {
                let points = forecast(&series, &self.model).await?;
                to_json(&points)
            }
        }
    }

    async fn fetch(&self, asset_id: &str) -> Result<Series, DeepcoinError> {
        debug!(asset = %asset_id, "fetching daily series");
        let series = tokio::time::timeout(
            self.fetch_timeout,
            self.market_data.fetch_daily_series(asset_id),
        )
        .await
        .map_err(|_| {
            DeepcoinError::data_unavailable(format!(
                "fetch for {asset_id} timed out after {}s",
                self.fetch_timeout.as_secs_f64()
            ))
        })??;
        debug!(asset = %asset_id, points = series.len(), "series fetched");
        Ok(series)
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DeepcoinError> {
    serde_json::to_string(value)
        .map_err(|e| DeepcoinError::computation(format!("serialization failed: {e}")))
}
