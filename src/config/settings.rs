use std::env;

/// Process-level configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub cache_ttl_secs: u64,
    pub cache_key_prefix: String,
    pub recent_videos_limit: usize,
    pub sweep_interval_secs: u64,
    pub sweep_channel_limit: usize,
    pub source_api_url: Option<String>,
    pub source_fixture_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            cache_key_prefix: env::var("CACHE_KEY_PREFIX")
                .unwrap_or_else(|_| "recent_videos".to_string()),
            recent_videos_limit: env::var("RECENT_VIDEOS_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            sweep_interval_secs: env::var("SWEEP_INTERVAL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            sweep_channel_limit: env::var("SWEEP_CHANNEL_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            source_api_url: env::var("SOURCE_API_URL").ok(),
            source_fixture_path: env::var("SOURCE_FIXTURE_PATH").ok(),
        }
    }

    pub fn validate_and_log(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
        if self.source_api_url.is_none() && self.source_fixture_path.is_none() {
            log::warn!(
                "Neither SOURCE_API_URL nor SOURCE_FIXTURE_PATH is set; \
                 external-source escalation will always report empty results"
            );
        }
    }

    /// Behavior knobs for the fetch orchestrator and sweeper. Passed
    /// explicitly at construction; never read from ambient state.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            recent_limit: self.recent_videos_limit,
            cache_ttl_secs: self.cache_ttl_secs,
            sweep_channel_limit: self.sweep_channel_limit,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// N: how many recent videos a read returns at most.
    pub recent_limit: usize,
    pub cache_ttl_secs: u64,
    /// K: how many recently-accessed channels each sweep refreshes.
    pub sweep_channel_limit: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            cache_ttl_secs: 300,
            sweep_channel_limit: 5,
        }
    }
}
