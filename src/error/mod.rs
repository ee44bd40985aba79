//! Crate-wide error taxonomy for the video service.
//!
//! Validation and not-found are expected failures with precise mappings;
//! storage and source failures propagate to the transport layer as a
//! generic 500-class condition. Reconciler task failures never surface
//! here at all (they are logged and dropped at the task boundary).

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum VideoServiceError {
    /// Missing or malformed caller input. Raised before any I/O.
    #[error("Validation Error: {0}")]
    Validation(String),

    /// Channel has no resolvable videos in the store or the external source.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// Record store failure on the read or write path.
    #[error("Storage Error: {0}")]
    Storage(String),

    /// External content source failure.
    #[error("Source Error: {0}")]
    Source(String),

    /// Cache backend failure that could not be degraded to a miss.
    #[error("Cache Error: {0}")]
    Cache(String),

    /// Configuration errors surfaced during startup wiring.
    #[error("Config Error: {0}")]
    Config(String),
}

impl VideoServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Storage(_) | Self::Source(_) | Self::Cache(_) | Self::Config(_) => 500,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Bad Request",
            Self::NotFound(_) => "Not Found",
            Self::Storage(_) | Self::Source(_) | Self::Cache(_) | Self::Config(_) => {
                "Internal Server Error"
            }
        }
    }

    /// Structured body for the transport layer. Unexpected conditions get a
    /// generic detail so internals never leak to callers.
    pub fn to_body(&self) -> ErrorBody {
        let detail = match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg.clone(),
            _ => "An unexpected error occurred.".to_string(),
        };
        ErrorBody {
            status: self.status_code().to_string(),
            title: self.title().to_string(),
            detail,
        }
    }
}

/// Error object shape handed to whatever transport sits above the service.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: String,
    pub title: String,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn validation_maps_to_400_with_detail() {
        let err = VideoServiceError::Validation("channel_id is required".to_string());
        let body = err.to_body();
        assert_eq!(body.status, "400");
        assert_eq!(body.title, "Bad Request");
        assert_eq!(body.detail, "channel_id is required");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = VideoServiceError::NotFound("channel not found".to_string());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_body().detail, "channel not found");
    }

    #[test]
    fn unexpected_errors_hide_internals() {
        let err = VideoServiceError::Storage("connection refused on 10.0.0.3".to_string());
        let body = err.to_body();
        assert_eq!(body.status, "500");
        assert_eq!(body.detail, "An unexpected error occurred.");
    }
}
