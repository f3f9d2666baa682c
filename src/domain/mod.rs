//! Core domain types and logic.

pub mod error;
pub mod forecast;
pub mod indicator;
pub mod indicator_engine;
pub mod model_handle;
pub mod pipeline;
pub mod price_point;
pub mod reconstruct;
pub mod returns;
pub mod settings;
