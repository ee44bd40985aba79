//! The fetch orchestrator: cache, then record store, then external source,
//! short-circuiting at the first sufficient rung.
//!
//! A cache entry only counts as a hit when every id still resolves in the
//! store and the full N are present; anything less falls through. A store
//! answer of any non-zero size is accepted as-is and never topped up from
//! the source. Only a channel with nothing in the store escalates to the
//! external provider, whose results are returned transiently and persisted
//! in the background.

use log::{debug, info};
use std::sync::Arc;

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::error::VideoServiceError;
use crate::models::{sort_most_recent, Video};
use crate::reconcile::Reconciler;
use crate::source::VideoSource;
use crate::storage::RecordStore;

pub struct VideoService {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn RecordStore>,
    source: Arc<dyn VideoSource>,
    reconciler: Reconciler,
    config: ServiceConfig,
}

impl VideoService {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn RecordStore>,
        source: Arc<dyn VideoSource>,
        reconciler: Reconciler,
        config: ServiceConfig,
    ) -> Self {
        Self {
            cache,
            store,
            source,
            reconciler,
            config,
        }
    }

    /// Returns the channel's most recent videos, newest first, at most N.
    ///
    /// Launches the access-touch task on every success and refreshes the
    /// cache entry whenever the result did not come from a full cache hit.
    /// Never waits on background work.
    pub async fn get_recent_videos(
        &self,
        channel_id: &str,
    ) -> Result<Vec<Video>, VideoServiceError> {
        if channel_id.is_empty() {
            return Err(VideoServiceError::Validation(
                "channel_id is required".to_string(),
            ));
        }

        info!("Fetching recent videos for channel: {channel_id}");
        let limit = self.config.recent_limit;

        if let Some(ids) = self.cache.get_ids(channel_id).await {
            let mut videos = self.store.videos_by_ids(&ids).await?;
            if videos.len() == limit {
                debug!("Cache hit for channel {channel_id}");
                sort_most_recent(&mut videos);
                self.reconciler.submit_touch(channel_id);
                return Ok(videos);
            }
            debug!(
                "Cache entry for channel {channel_id} resolved to {} of {limit} videos, \
                 falling through to store",
                videos.len()
            );
        } else {
            debug!("Cache miss for channel {channel_id}, fetching from store");
        }

        let mut videos = self.store.recent_videos(channel_id, limit).await?;

        if videos.is_empty() {
            info!("Channel {channel_id} has no stored videos, escalating to external source");
            let records = self.source.fetch_top_videos(channel_id, limit).await?;
            if records.is_empty() {
                return Err(VideoServiceError::NotFound(
                    "channel not found or no videos available".to_string(),
                ));
            }

            videos = records
                .iter()
                .cloned()
                .filter_map(|r| r.into_video(channel_id))
                .collect();
            if videos.is_empty() {
                return Err(VideoServiceError::Source(format!(
                    "Source returned {} records for channel {channel_id}, none parseable",
                    records.len()
                )));
            }

            // Persist in the background; the transient values are the result.
            self.reconciler.submit_persist(channel_id, records);
        }

        sort_most_recent(&mut videos);
        videos.truncate(limit);

        let ids: Vec<String> = videos.iter().map(|v| v.video_id.clone()).collect();
        self.cache
            .set_ids(channel_id, &ids, self.config.cache_ttl_secs)
            .await;
        self.reconciler.submit_touch(channel_id);

        Ok(videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoRecord;
    use crate::reconcile::persist_videos;
    use crate::storage::MemoryRecordStore;
    use crate::testing::{record, DeferredExecutor, RecordingCache, StaticSource};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::Ordering;

    struct Harness {
        cache: Arc<RecordingCache>,
        store: Arc<MemoryRecordStore>,
        source: Arc<StaticSource>,
        executor: Arc<DeferredExecutor>,
        service: VideoService,
    }

    fn harness(source: StaticSource) -> Harness {
        let cache = Arc::new(RecordingCache::default());
        let store = Arc::new(MemoryRecordStore::new());
        let source = Arc::new(source);
        let executor = Arc::new(DeferredExecutor::default());
        let reconciler = Reconciler::new(store.clone(), executor.clone());
        let service = VideoService::new(
            cache.clone(),
            store.clone(),
            source.clone(),
            reconciler,
            ServiceConfig::default(),
        );
        Harness {
            cache,
            store,
            source,
            executor,
            service,
        }
    }

    fn five_records() -> Vec<VideoRecord> {
        (0..5).map(|i| record(&format!("vid{i}"), "2024-03-01")).collect()
    }

    async fn seed_store(h: &Harness, channel_id: &str, records: Vec<VideoRecord>) {
        persist_videos(h.store.as_ref(), channel_id, records)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_channel_id_fails_before_any_backend_call() {
        let h = harness(StaticSource::default());
        let err = h.service.get_recent_videos("").await.unwrap_err();
        assert!(matches!(err, VideoServiceError::Validation(_)));
        assert_eq!(h.cache.gets.load(Ordering::SeqCst), 0);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.executor.pending(), 0);
    }

    #[tokio::test]
    async fn full_cache_hit_skips_source_and_cache_refresh() {
        let h = harness(StaticSource::default());
        seed_store(&h, "UC123456", five_records()).await;
        h.cache
            .preload("UC123456", &["vid0", "vid1", "vid2", "vid3", "vid4"]);

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();

        assert_eq!(videos.len(), 5);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.cache.sets.load(Ordering::SeqCst), 0);
        // Only the access-touch task runs on a hit.
        assert_eq!(h.executor.submitted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_cache_entry_falls_through_to_store() {
        let h = harness(StaticSource::default());
        seed_store(&h, "UC123456", five_records()).await;
        // Two of the cached ids no longer resolve.
        h.cache
            .preload("UC123456", &["vid0", "vid1", "vid2", "gone1", "gone2"]);

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();

        assert_eq!(videos.len(), 5);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn store_fallback_returns_min_of_limit_and_store_count() {
        let h = harness(StaticSource::default());
        seed_store(
            &h,
            "UC123456",
            vec![record("vid0", "2024-03-01"), record("vid1", "2024-03-02")],
        )
        .await;

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();

        // Two stored videos suffice; the source is never consulted even
        // though fewer than N exist.
        assert_eq!(videos.len(), 2);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.cache.sets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_store_escalates_to_source_exactly_once() {
        let h = harness(StaticSource::default().with_channel("UC123456", five_records()));

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();

        assert_eq!(videos.len(), 5);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 1);
        // Transient result: nothing persisted until the executor runs.
        assert!(h.store.get_channel("UC123456").await.unwrap().is_none());

        h.executor.drain().await;
        assert_eq!(h.store.recent_videos("UC123456", 10).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn missing_everywhere_is_not_found() {
        let h = harness(StaticSource::default());
        let err = h.service.get_recent_videos("NON_EXISTENT").await.unwrap_err();
        match err {
            VideoServiceError::NotFound(msg) => assert!(msg.contains("not found")),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cache_outage_degrades_to_store_read() {
        let h = harness(StaticSource::default());
        seed_store(&h, "UC123456", five_records()).await;
        h.cache.preload("UC123456", &["vid0", "vid1", "vid2", "vid3", "vid4"]);
        h.cache.fail_reads.store(true, Ordering::SeqCst);

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();
        assert_eq!(videos.len(), 5);
        assert_eq!(h.source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn results_are_sorted_desc_with_id_tiebreak() {
        let h = harness(StaticSource::default());
        seed_store(
            &h,
            "UC123456",
            vec![
                record("b", "2024-03-01"),
                record("a", "2024-03-01"),
                record("c", "2024-03-02"),
            ],
        )
        .await;

        let videos = h.service.get_recent_videos("UC123456").await.unwrap();
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn successful_read_triggers_one_cache_set_and_one_touch() {
        let h = harness(StaticSource::default());
        seed_store(&h, "UC123456", five_records()).await;

        h.service.get_recent_videos("UC123456").await.unwrap();

        assert_eq!(h.cache.sets.load(Ordering::SeqCst), 1);
        assert_eq!(h.executor.submitted.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.cache.entry("UC123456").unwrap(),
            vec!["vid0", "vid1", "vid2", "vid3", "vid4"]
        );

        h.executor.drain().await;
        let before = h.store.get_channel("UC123456").await.unwrap().unwrap();
        assert!(before.last_accessed >= before.created_at);
    }
}
