//! Concrete adapter implementations for ports.

pub mod coingecko_adapter;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod memory_cache;
pub mod onnx_model;
#[cfg(feature = "web")]
pub mod web;
