//! Domain entities and the deterministic recency ordering shared by the
//! record store, the orchestrator, and the sweeper.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A content publisher, keyed by its stable channel id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub name: Option<String>,
    /// Set once at creation, never mutated afterwards.
    pub created_at: DateTime<Utc>,
    /// Touched on every successful read; asynchronous writers may lag.
    pub last_accessed: DateTime<Utc>,
}

impl Channel {
    pub fn new(channel_id: impl Into<String>, name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            channel_id: channel_id.into(),
            name,
            created_at: now,
            last_accessed: now,
        }
    }
}

/// A stored video belonging to exactly one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub video_id: String,
    pub video_title: String,
    pub upload_date: DateTime<Utc>,
    pub channel_id: String,
}

/// A record returned by the external content source, not yet persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub video_title: String,
    pub upload_date: String,
}

impl VideoRecord {
    /// Builds a transient `Video` for the given channel. Fails only when the
    /// upload date cannot be parsed in any accepted format.
    pub fn into_video(self, channel_id: &str) -> Option<Video> {
        let upload_date = parse_upload_date(&self.upload_date)?;
        Some(Video {
            video_id: self.video_id,
            video_title: self.video_title,
            upload_date,
            channel_id: channel_id.to_string(),
        })
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates; plain dates
/// resolve to midnight UTC.
pub fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

/// Sorts newest-first; equal upload dates break by video id ascending so the
/// "top N" set is stable across store, cache, and re-sorted source results.
pub fn sort_most_recent(videos: &mut [Video]) {
    videos.sort_by(|a, b| {
        b.upload_date
            .cmp(&a.upload_date)
            .then_with(|| a.video_id.cmp(&b.video_id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn video(id: &str, date: &str) -> Video {
        Video {
            video_id: id.to_string(),
            video_title: format!("Video {id}"),
            upload_date: parse_upload_date(date).unwrap(),
            channel_id: "UC123456".to_string(),
        }
    }

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        let plain = parse_upload_date("2024-03-01").unwrap();
        assert_eq!(plain.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let full = parse_upload_date("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(full.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        assert!(parse_upload_date("03/01/2024").is_none());
    }

    #[test]
    fn sorts_newest_first_with_id_tiebreak() {
        let mut videos = vec![
            video("b", "2024-03-01"),
            video("a", "2024-03-01"),
            video("c", "2024-03-02"),
        ];
        sort_most_recent(&mut videos);
        let ids: Vec<&str> = videos.iter().map(|v| v.video_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn record_with_bad_date_is_rejected() {
        let record = VideoRecord {
            video_id: "vid0".to_string(),
            video_title: "Video 0".to_string(),
            upload_date: "not-a-date".to_string(),
        };
        assert!(record.into_video("UC123456").is_none());
    }
}
