//! Periodic cache refill for the most recently accessed channels.
//!
//! Strictly a hit-rate optimization: a failed or skipped sweep never
//! affects read-path correctness, so every failure here is logged and
//! swallowed.

use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::storage::RecordStore;

pub struct CacheSweeper {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    config: ServiceConfig,
    is_running: Arc<AtomicBool>,
}

impl CacheSweeper {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn RecordStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// One sweep: recompute cache entries for the K most recently accessed
    /// channels. Exposed so an external scheduler can drive it directly.
    pub async fn run_once(&self) {
        info!("Running periodic video cache refresh");

        let channels = match self
            .store
            .recently_accessed_channels(self.config.sweep_channel_limit)
            .await
        {
            Ok(channels) => channels,
            Err(e) => {
                error!("Cache sweep could not list active channels: {e}");
                return;
            }
        };

        let mut refreshed = 0usize;
        for channel in &channels {
            let videos = match self
                .store
                .recent_videos(&channel.channel_id, self.config.recent_limit)
                .await
            {
                Ok(videos) => videos,
                Err(e) => {
                    error!(
                        "Cache sweep failed to load videos for {}: {e}",
                        channel.channel_id
                    );
                    continue;
                }
            };

            if videos.is_empty() {
                continue;
            }

            let ids: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
            self.cache
                .set_ids(&channel.channel_id, &ids, self.config.cache_ttl_secs)
                .await;
            refreshed += 1;
        }

        info!(
            "Cache refresh updated {refreshed} of {} active channels",
            channels.len()
        );
    }

    /// Spawns the interval loop. Returns the handle; call [`stop`] to let
    /// the loop wind down after its current tick.
    ///
    /// [`stop`]: CacheSweeper::stop
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        self.is_running.store(true, Ordering::SeqCst);
        let sweeper = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick fires immediately; skip it so startup reads
            // are not racing a sweep of an empty store.
            ticker.tick().await;
            while sweeper.is_running.load(Ordering::SeqCst) {
                ticker.tick().await;
                sweeper.run_once().await;
            }
        })
    }

    pub fn stop(&self) {
        self.is_running.store(false, Ordering::SeqCst);
    }
}
