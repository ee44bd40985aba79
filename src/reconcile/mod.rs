//! Fire-and-forget reconciliation tasks.
//!
//! The read path launches these and returns immediately; neither task may
//! block the caller, and neither failure may reach it. Both tasks are
//! idempotent, so at-most-once delivery and lost tasks are acceptable, and
//! no ordering holds between a persist and a touch for the same channel.

use futures::future::BoxFuture;
use log::{error, info};
use std::sync::Arc;

use crate::models::VideoRecord;
use crate::storage::RecordStore;

/// Execution seam for background work. The in-process implementation spawns
/// onto the tokio runtime; a durable task queue can sit behind the same
/// interface without the read path noticing.
pub trait TaskExecutor: Send + Sync {
    fn submit(&self, task: BoxFuture<'static, ()>);
}

/// Spawns each task onto the ambient tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioExecutor;

impl TaskExecutor for TokioExecutor {
    fn submit(&self, task: BoxFuture<'static, ()>) {
        tokio::spawn(task);
    }
}

/// Submits persistence and access-recency updates without blocking callers.
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    executor: Arc<dyn TaskExecutor>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>, executor: Arc<dyn TaskExecutor>) -> Self {
        Self { store, executor }
    }

    /// Ensures the channel exists and bulk-inserts the fetched records,
    /// skipping rows that are already present.
    pub fn submit_persist(&self, channel_id: &str, records: Vec<VideoRecord>) {
        let store = self.store.clone();
        let channel_id = channel_id.to_string();
        self.executor.submit(Box::pin(async move {
            if let Err(e) = persist_videos(store.as_ref(), &channel_id, records).await {
                error!("Failed to store videos for {channel_id}: {e}");
            }
        }));
    }

    /// Stamps the channel's last-accessed time. Channels that do not exist
    /// yet are left alone; the persist task is what creates them.
    pub fn submit_touch(&self, channel_id: &str) {
        let store = self.store.clone();
        let channel_id = channel_id.to_string();
        self.executor.submit(Box::pin(async move {
            if let Err(e) = store.touch_last_accessed(&channel_id).await {
                error!("Failed to update last_accessed for {channel_id}: {e}");
            }
        }));
    }
}

/// The persist task body: get-or-create the channel, then one atomic
/// insert-or-skip batch. Split out so tests can drive it synchronously.
pub async fn persist_videos(
    store: &dyn RecordStore,
    channel_id: &str,
    records: Vec<VideoRecord>,
) -> Result<(), crate::error::VideoServiceError> {
    store
        .get_or_create_channel(channel_id, Some(format!("Channel {channel_id}")))
        .await?;

    let batch: Vec<_> = records
        .into_iter()
        .filter_map(|r| r.into_video(channel_id))
        .collect();
    let inserted = store.insert_videos_skip_existing(&batch).await?;
    info!("Stored {inserted} new videos for channel {channel_id}");
    Ok(())
}
