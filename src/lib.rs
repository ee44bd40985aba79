pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod reconcile;
pub mod service;
pub mod source;
pub mod storage;
pub mod sweeper;
pub mod testing; // In-memory doubles shared by unit and integration tests

// Re-export the key entry points for consumers of the library.
pub use cache::{CacheStore, RedisCache};
pub use config::{Config, ServiceConfig};
pub use error::{ErrorBody, VideoServiceError};
pub use models::{Channel, Video, VideoRecord};
pub use reconcile::{Reconciler, TaskExecutor, TokioExecutor};
pub use service::VideoService;
pub use source::{FixtureSource, HttpVideoSource, VideoSource};
pub use storage::{MemoryRecordStore, RecordStore};
pub use sweeper::CacheSweeper;
