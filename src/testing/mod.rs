//! In-memory doubles for the cache, source, and task-executor seams.
//!
//! These count every call so tests can assert not just on results but on
//! which rungs of the fallback chain were exercised.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cache::CacheStore;
use crate::error::VideoServiceError;
use crate::models::VideoRecord;
use crate::reconcile::TaskExecutor;
use crate::source::VideoSource;

/// Map-backed cache that records get/set call counts.
#[derive(Default)]
pub struct RecordingCache {
    entries: Mutex<HashMap<String, Vec<String>>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    /// When set, every `get_ids` behaves like a backend outage.
    pub fail_reads: std::sync::atomic::AtomicBool,
}

impl RecordingCache {
    pub fn preload(&self, channel_id: &str, ids: &[&str]) {
        self.entries.lock().unwrap().insert(
            channel_id.to_string(),
            ids.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn entry(&self, channel_id: &str) -> Option<Vec<String>> {
        self.entries.lock().unwrap().get(channel_id).cloned()
    }
}

#[async_trait]
impl CacheStore for RecordingCache {
    async fn get_ids(&self, channel_id: &str) -> Option<Vec<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return None;
        }
        self.entries.lock().unwrap().get(channel_id).cloned()
    }

    async fn set_ids(&self, channel_id: &str, ids: &[String], _ttl_secs: u64) {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), ids.to_vec());
    }
}

/// Source double returning a fixed record set per channel.
#[derive(Default)]
pub struct StaticSource {
    records: Mutex<HashMap<String, Vec<VideoRecord>>>,
    pub calls: AtomicUsize,
}

impl StaticSource {
    pub fn with_channel(self, channel_id: &str, records: Vec<VideoRecord>) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(channel_id.to_string(), records);
        self
    }
}

#[async_trait]
impl VideoSource for StaticSource {
    async fn fetch_top_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoRecord>, VideoServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self
            .records
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default();
        records.truncate(limit);
        Ok(records)
    }
}

/// Captures submitted tasks instead of running them, so tests can prove the
/// read path never waits on background work, then drain explicitly.
#[derive(Default)]
pub struct DeferredExecutor {
    tasks: Mutex<Vec<BoxFuture<'static, ()>>>,
    pub submitted: AtomicUsize,
}

impl DeferredExecutor {
    pub async fn drain(&self) {
        let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            task.await;
        }
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl TaskExecutor for DeferredExecutor {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        self.submitted.fetch_add(1, Ordering::SeqCst);
        self.tasks.lock().unwrap().push(task);
    }
}

/// Convenience builder for source-side records.
pub fn record(video_id: &str, upload_date: &str) -> VideoRecord {
    VideoRecord {
        video_id: video_id.to_string(),
        video_title: format!("Video {video_id}"),
        upload_date: upload_date.to_string(),
    }
}
