//! Port traits at the seams between domain logic and the outside world.

pub mod cache_port;
pub mod config_port;
pub mod market_data_port;
pub mod model_port;
