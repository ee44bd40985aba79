//! Record store contract and the in-memory reference implementation.
//!
//! The store is the source of truth for channels and videos; the cache
//! layer only ever holds ids derived from it. Real deployments put a
//! relational store behind [`RecordStore`]; the dashmap-backed
//! [`MemoryRecordStore`] serves the binary's demo mode and the tests.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::VideoServiceError;
use crate::models::{sort_most_recent, Channel, Video};

/// Durable channel/video storage.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_channel(&self, channel_id: &str)
        -> Result<Option<Channel>, VideoServiceError>;

    /// Returns the existing channel or creates one with the given name.
    async fn get_or_create_channel(
        &self,
        channel_id: &str,
        name: Option<String>,
    ) -> Result<Channel, VideoServiceError>;

    /// Resolves ids to stored videos. Ids with no matching row are dropped;
    /// callers compare result size against the requested set.
    async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, VideoServiceError>;

    /// The channel's videos, newest first, at most `limit`.
    async fn recent_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<Video>, VideoServiceError>;

    /// Bulk insert, skipping rows whose video id already exists. The whole
    /// batch is applied atomically. Returns the number of rows inserted.
    async fn insert_videos_skip_existing(
        &self,
        videos: &[Video],
    ) -> Result<usize, VideoServiceError>;

    /// Sets the channel's last-accessed timestamp to now. No-op when the
    /// channel row does not exist.
    async fn touch_last_accessed(&self, channel_id: &str) -> Result<(), VideoServiceError>;

    /// The `limit` channels with the most recent last-accessed timestamp.
    async fn recently_accessed_channels(
        &self,
        limit: usize,
    ) -> Result<Vec<Channel>, VideoServiceError>;
}

/// In-process store. Channels live in a `DashMap`; videos sit behind one
/// async mutex so a batch insert is atomic with respect to readers.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    channels: DashMap<String, Channel>,
    videos: Mutex<HashMap<String, Video>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get_channel(
        &self,
        channel_id: &str,
    ) -> Result<Option<Channel>, VideoServiceError> {
        Ok(self.channels.get(channel_id).map(|c| c.value().clone()))
    }

    async fn get_or_create_channel(
        &self,
        channel_id: &str,
        name: Option<String>,
    ) -> Result<Channel, VideoServiceError> {
        let entry = self
            .channels
            .entry(channel_id.to_string())
            .or_insert_with(|| Channel::new(channel_id, name));
        Ok(entry.value().clone())
    }

    async fn videos_by_ids(&self, ids: &[String]) -> Result<Vec<Video>, VideoServiceError> {
        let videos = self.videos.lock().await;
        let mut found: Vec<Video> = ids.iter().filter_map(|id| videos.get(id).cloned()).collect();
        sort_most_recent(&mut found);
        Ok(found)
    }

    async fn recent_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<Video>, VideoServiceError> {
        let videos = self.videos.lock().await;
        let mut matching: Vec<Video> = videos
            .values()
            .filter(|v| v.channel_id == channel_id)
            .cloned()
            .collect();
        sort_most_recent(&mut matching);
        matching.truncate(limit);
        Ok(matching)
    }

    async fn insert_videos_skip_existing(
        &self,
        batch: &[Video],
    ) -> Result<usize, VideoServiceError> {
        for video in batch {
            if !self.channels.contains_key(&video.channel_id) {
                return Err(VideoServiceError::Storage(format!(
                    "Cannot insert video {}: channel {} does not exist",
                    video.video_id, video.channel_id
                )));
            }
        }

        // One guard held for the whole batch keeps partial inserts invisible.
        let mut videos = self.videos.lock().await;
        let mut inserted = 0;
        for video in batch {
            if !videos.contains_key(&video.video_id) {
                videos.insert(video.video_id.clone(), video.clone());
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn touch_last_accessed(&self, channel_id: &str) -> Result<(), VideoServiceError> {
        if let Some(mut channel) = self.channels.get_mut(channel_id) {
            channel.last_accessed = Utc::now();
        }
        Ok(())
    }

    async fn recently_accessed_channels(
        &self,
        limit: usize,
    ) -> Result<Vec<Channel>, VideoServiceError> {
        let mut channels: Vec<Channel> =
            self.channels.iter().map(|c| c.value().clone()).collect();
        channels.sort_by(|a, b| {
            b.last_accessed
                .cmp(&a.last_accessed)
                .then_with(|| a.channel_id.cmp(&b.channel_id))
        });
        channels.truncate(limit);
        Ok(channels)
    }
}
