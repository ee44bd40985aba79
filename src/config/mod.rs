pub mod settings;

pub use settings::{Config, ServiceConfig};

use crate::error::VideoServiceError;
use std::sync::Arc;

/// Loads and returns the application configuration as an `Arc<Config>`.
/// Centralizes the dotenv load and the critical-value checks.
pub fn load_config() -> Result<Arc<Config>, VideoServiceError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();

    if config.redis_url.is_empty() {
        return Err(VideoServiceError::Config(
            "REDIS_URL cannot be empty".to_string(),
        ));
    }
    if config.recent_videos_limit == 0 {
        return Err(VideoServiceError::Config(
            "RECENT_VIDEOS_LIMIT must be at least 1".to_string(),
        ));
    }

    config.validate_and_log();

    Ok(Arc::new(config))
}
