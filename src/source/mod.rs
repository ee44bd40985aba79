//! External content source adapters.
//!
//! The source is the last rung of the fallback chain: it is consulted only
//! when the record store has nothing for a channel. An empty result means
//! "channel unknown or has no videos" and is not an error; transport and
//! decode failures are.

use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::VideoServiceError;
use crate::models::VideoRecord;

/// Queryable provider of a channel's most recent videos.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Up to `limit` records for the channel, newest first. The orchestrator
    /// re-sorts defensively, so ordering here is best-effort.
    async fn fetch_top_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoRecord>, VideoServiceError>;
}

/// HTTP adapter for a real content provider:
/// `GET {base_url}/channels/{channel_id}/videos?limit={limit}` returning a
/// JSON array of records.
pub struct HttpVideoSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVideoSource {
    pub fn new(base_url: &str) -> Result<Self, VideoServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| VideoServiceError::Source(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VideoSource for HttpVideoSource {
    async fn fetch_top_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoRecord>, VideoServiceError> {
        let url = format!("{}/channels/{channel_id}/videos", self.base_url);
        info!("Fetching up to {limit} videos for channel {channel_id} from {url}");

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .send()
            .await
            .map_err(|e| VideoServiceError::Source(format!("Source request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(VideoServiceError::Source(format!(
                "Source returned status {} for channel {channel_id}",
                response.status()
            )));
        }

        let mut records: Vec<VideoRecord> = response
            .json()
            .await
            .map_err(|e| VideoServiceError::Source(format!("Invalid source payload: {e}")))?;
        records.truncate(limit);
        Ok(records)
    }
}

/// File-backed adapter simulating the provider: a JSON object mapping
/// channel ids to arrays of records. A missing file or unknown channel
/// reads as empty, matching the provider's "channel unknown" signal.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl VideoSource for FixtureSource {
    async fn fetch_top_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoRecord>, VideoServiceError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Fixture file {} not readable: {e}", self.path.display());
                return Ok(Vec::new());
            }
        };

        let mut by_channel: HashMap<String, Vec<VideoRecord>> = serde_json::from_str(&raw)
            .map_err(|e| VideoServiceError::Source(format!("Invalid fixture JSON: {e}")))?;

        let mut records = by_channel.remove(channel_id).unwrap_or_default();
        // Newest first; the fixture file carries no ordering guarantee.
        records.sort_by(|a, b| {
            b.upload_date
                .cmp(&a.upload_date)
                .then_with(|| a.video_id.cmp(&b.video_id))
        });
        records.truncate(limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[tokio::test]
    async fn fixture_returns_top_records_newest_first() {
        let dir = std::env::temp_dir().join("videoservice-fixture-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("videos.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"UC123456": [
                {{"video_id": "vid0", "video_title": "Video 0", "upload_date": "2024-02-28"}},
                {{"video_id": "vid1", "video_title": "Video 1", "upload_date": "2024-03-01"}},
                {{"video_id": "vid2", "video_title": "Video 2", "upload_date": "2024-03-02"}}
            ]}}"#
        )
        .unwrap();

        let source = FixtureSource::new(&path);
        let records = source.fetch_top_videos("UC123456", 2).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["vid2", "vid1"]);
    }

    #[tokio::test]
    async fn fixture_missing_file_reads_as_empty() {
        let source = FixtureSource::new("/nonexistent/videos.json");
        let records = source.fetch_top_videos("UC123456", 5).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fixture_unknown_channel_reads_as_empty() {
        let dir = std::env::temp_dir().join("videoservice-fixture-test-unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("videos.json");
        std::fs::write(&path, r#"{"UC123456": []}"#).unwrap();

        let source = FixtureSource::new(&path);
        let records = source.fetch_top_videos("NON_EXISTENT", 5).await.unwrap();
        assert!(records.is_empty());
    }
}
