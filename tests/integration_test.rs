//! Pipeline integration tests with mock market data and mock models.
//!
//! Tests cover:
//! - Indicator and forecast output shape end to end
//! - Memoization: byte-identical hits, failures never stored
//! - Collapsing of concurrent misses onto one computation
//! - Lazy, single model load shared across requests
//! - Fetch timeout and error propagation into the error object

mod common;

use common::*;
use deepcoin::domain::error::{error_body, DeepcoinError, ErrorKind};
use deepcoin::domain::model_handle::ModelHandle;
use deepcoin::domain::pipeline::{CacheKey, PipelineKind, PipelineOrchestrator};
use deepcoin::adapters::memory_cache::MemoizeForever;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

mod indicator_pipeline {
    use super::*;

    #[tokio::test]
    async fn rows_carry_every_column() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(60)));
        let orch = orchestrator(market, Arc::new(MockLoader::ready(0.0)));

        let body = orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .unwrap();
        let rows: Vec<Value> = serde_json::from_str(&body).unwrap();

        assert!(!rows.is_empty());
        assert!(rows.len() <= 60);
        let expected: BTreeSet<&str> = [
            "timestamp",
            "price",
            "Market_Cap",
            "Volume_24h",
            "Percent_Change_1h",
            "Percent_Change_24h",
            "Percent_Change_7d",
            "Percent_Change_30d",
            "SMA_20",
            "SMA_50",
            "EMA_20",
            "EMA_50",
            "RSI",
            "MACD",
            "MACD_Signal",
            "OBV",
        ]
        .into_iter()
        .collect();
        for row in &rows {
            let obj = row.as_object().unwrap();
            let keys: BTreeSet<&str> = obj.keys().map(String::as_str).collect();
            assert_eq!(keys, expected);
            assert!(obj["Percent_Change_1h"].is_null());
            assert!(obj["price"].is_f64());
        }
        let last = rows.last().unwrap();
        assert!(last["SMA_20"].is_f64());
        assert!(last["SMA_50"].is_f64());
        assert!(last["MACD_Signal"].is_f64());
        assert_eq!(last["timestamp"], "2024-02-29T00:00:00Z");
    }

    #[tokio::test]
    async fn single_point_series_gives_empty_table() {
        let market = Arc::new(MockMarketData::new().with_series("newcoin", wave_series(1)));
        let orch = orchestrator(market, Arc::new(MockLoader::ready(0.0)));

        let body = orch
            .get_or_compute("newcoin", PipelineKind::Indicators)
            .await
            .unwrap();
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn short_series_does_not_need_the_model() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(30)));
        let loader = Arc::new(MockLoader::missing());
        let orch = orchestrator(market, Arc::clone(&loader));

        assert!(orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .is_ok());
        assert_eq!(loader.load_count(), 0);
        assert!(!orch.model().is_loaded());
    }
}

mod forecast_pipeline {
    use super::*;

    #[tokio::test]
    async fn history_then_seven_future_days() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let orch = orchestrator(market, Arc::new(MockLoader::ready(0.0)));

        let body = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();
        let points: Vec<Value> = serde_json::from_str(&body).unwrap();

        assert_eq!(points.len(), 107);
        // 2024-01-01 + 399 days
        assert_eq!(points[99]["date"], "2025-02-03");
        assert_eq!(points[100]["date"], "2025-02-04");
        assert_eq!(points[106]["date"], "2025-02-10");
        for p in &points[100..] {
            assert!(p["price"].as_f64().unwrap() > 0.0);
        }
    }

    #[tokio::test]
    async fn exactly_365_points_is_insufficient() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(365)));
        let loader = Arc::new(MockLoader::ready(0.0));
        let orch = orchestrator(market, Arc::clone(&loader));

        let err = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DeepcoinError::InsufficientHistory {
                points: 365,
                minimum: 366
            }
        ));
        assert_eq!(loader.load_count(), 0);
    }

    #[tokio::test]
    async fn minimum_history_is_accepted() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(366)));
        let orch = orchestrator(market, Arc::new(MockLoader::ready(0.5)));

        let body = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();
        let points: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(points.len(), 107);
    }

    #[tokio::test]
    async fn missing_model_yields_error_object() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let orch = orchestrator(market, Arc::new(MockLoader::missing()));

        let err = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap_err();
        let body = error_body(&err);
        let value: Value = serde_json::from_str(&body).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj["error"].as_str().unwrap().starts_with("model unavailable"));
    }

    #[tokio::test]
    async fn model_loads_once_across_assets() {
        let market = Arc::new(
            MockMarketData::new()
                .with_series("bitcoin", wave_series(400))
                .with_series("ethereum", wave_series(500)),
        );
        let loader = Arc::new(MockLoader::ready(0.0));
        let orch = orchestrator(market, Arc::clone(&loader));

        assert!(!orch.model().is_loaded());
        orch.get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();
        orch.get_or_compute("ethereum", PipelineKind::Forecast)
            .await
            .unwrap();
        assert!(orch.model().is_loaded());
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test]
    async fn slow_model_load_times_out_then_completes_once() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let loader = Arc::new(SlowLoader::new());
        let orch = PipelineOrchestrator::new(
            market,
            ModelHandle::new(loader.clone(), Duration::from_millis(50)),
            Arc::new(MemoizeForever::<CacheKey, String>::new()),
            Duration::from_secs(5),
        );

        for _ in 0..2 {
            let err = orch
                .get_or_compute("bitcoin", PipelineKind::Forecast)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
            assert!(err.to_string().contains("timed out"));
        }
        assert!(!orch.model().is_loaded());

        loader.release();
        let body = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();
        let points: Vec<Value> = serde_json::from_str(&body).unwrap();
        assert_eq!(points.len(), 107);

        assert_eq!(loader.load_count(), 1);
        assert_eq!(loader.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn failed_model_load_is_retried() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let loader = Arc::new(MockLoader::missing());
        let orch = orchestrator(market, Arc::clone(&loader));

        for _ in 0..2 {
            let err = orch
                .get_or_compute("bitcoin", PipelineKind::Forecast)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        }
        assert_eq!(loader.load_count(), 2);
    }
}

mod memoization {
    use super::*;

    #[tokio::test]
    async fn hit_is_byte_identical_and_skips_fetch() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let orch = orchestrator(Arc::clone(&market), Arc::new(MockLoader::ready(0.1)));

        let first = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();
        let second = orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(market.fetch_count(), 1);
    }

    #[tokio::test]
    async fn asset_id_is_case_and_space_insensitive() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(60)));
        let orch = orchestrator(Arc::clone(&market), Arc::new(MockLoader::ready(0.0)));

        let a = orch
            .get_or_compute(" Bitcoin ", PipelineKind::Indicators)
            .await
            .unwrap();
        let b = orch
            .get_or_compute("BITCOIN", PipelineKind::Indicators)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(market.fetch_count(), 1);
    }

    #[tokio::test]
    async fn failures_are_not_stored() {
        let market = Arc::new(
            MockMarketData::new()
                .with_series("bitcoin", wave_series(60))
                .failing_first(1),
        );
        let orch = orchestrator(Arc::clone(&market), Arc::new(MockLoader::ready(0.0)));

        let err = orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);

        assert!(orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .is_ok());
        assert_eq!(market.fetch_count(), 2);
    }

    #[tokio::test]
    async fn pipelines_are_cached_independently() {
        let market = Arc::new(MockMarketData::new().with_series("bitcoin", wave_series(400)));
        let orch = orchestrator(Arc::clone(&market), Arc::new(MockLoader::missing()));

        assert!(orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .is_ok());
        assert!(orch
            .get_or_compute("bitcoin", PipelineKind::Forecast)
            .await
            .is_err());
        assert!(orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .is_ok());
        // one fetch for indicators, one for the failed forecast
        assert_eq!(market.fetch_count(), 2);
    }

    #[tokio::test]
    async fn empty_asset_id_is_rejected() {
        let market = Arc::new(MockMarketData::new());
        let orch = orchestrator(Arc::clone(&market), Arc::new(MockLoader::ready(0.0)));

        let err = orch
            .get_or_compute("   ", PipelineKind::Indicators)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert_eq!(market.fetch_count(), 0);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_computation() {
        let market = Arc::new(
            MockMarketData::new()
                .with_series("bitcoin", wave_series(400))
                .with_delay(Duration::from_millis(100)),
        );
        let loader = Arc::new(MockLoader::ready(0.0));
        let orch = Arc::new(orchestrator(Arc::clone(&market), Arc::clone(&loader)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let orch = Arc::clone(&orch);
                tokio::spawn(async move {
                    orch.get_or_compute("bitcoin", PipelineKind::Forecast).await
                })
            })
            .collect();

        let mut bodies = Vec::new();
        for handle in handles {
            bodies.push(handle.await.unwrap().unwrap());
        }

        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(market.fetch_count(), 1);
        assert_eq!(loader.load_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn different_assets_do_not_block_each_other() {
        let market = Arc::new(
            MockMarketData::new()
                .with_series("bitcoin", wave_series(60))
                .with_series("ethereum", wave_series(60))
                .with_delay(Duration::from_secs(1)),
        );
        let orch = Arc::new(orchestrator(Arc::clone(&market), Arc::new(MockLoader::ready(0.0))));

        let start = tokio::time::Instant::now();
        let a = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_or_compute("bitcoin", PipelineKind::Indicators).await })
        };
        let b = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.get_or_compute("ethereum", PipelineKind::Indicators).await })
        };
        assert!(a.await.unwrap().is_ok());
        assert!(b.await.unwrap().is_ok());

        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(market.fetch_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out_as_data_unavailable() {
        let market = Arc::new(
            MockMarketData::new()
                .with_series("bitcoin", wave_series(60))
                .with_delay(Duration::from_secs(60)),
        );
        let orch = PipelineOrchestrator::new(
            market,
            ModelHandle::new(Arc::new(MockLoader::ready(0.0)), Duration::from_secs(5)),
            Arc::new(MemoizeForever::<CacheKey, String>::new()),
            Duration::from_secs(2),
        );

        let err = orch
            .get_or_compute("bitcoin", PipelineKind::Indicators)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
        assert!(err.to_string().contains("timed out"));
    }
}
