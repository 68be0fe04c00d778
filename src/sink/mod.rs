//! File sink collaborators
//!
//! A [`FileSink`] persists converted bytes somewhere user-visible. The
//! [`ResultAggregator`](crate::aggregator::ResultAggregator) decides *what* to
//! write; the sink decides *where*.
//!
//! - [`DirectorySink`]: writes into `<output_dir>/<app_folder>/` on the local filesystem

mod directory;

pub use directory::DirectorySink;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::error::DownloadError;

/// Persists named, typed byte payloads
///
/// Implementations create any folder they write into and report I/O failures,
/// permission denials and storage exhaustion as [`DownloadError`]s.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Store `bytes` as `file_name`, returning where it ended up
    async fn write(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DownloadError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
