pub mod config;
pub mod model;
pub mod urls;

pub use config::{AppConfig, PlaybackConfig, SearchConfig};
pub use model::{Phase, PoolError, Track, TrackOption, TrackPool, MIN_POOL_SIZE, TOTAL_ROUNDS};
