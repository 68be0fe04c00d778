//! Filesystem sink writing into an application-named folder

use super::FileSink;
use crate::config::{FileCollisionAction, OutputConfig};
use crate::error::DownloadError;
use crate::utils::{get_unique_path, validate_file_name};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes files into a single directory, creating it on first use
pub struct DirectorySink {
    target_dir: PathBuf,
    collision: FileCollisionAction,
}

impl DirectorySink {
    /// Sink writing directly into `target_dir`
    pub fn new(target_dir: impl Into<PathBuf>, collision: FileCollisionAction) -> Self {
        Self {
            target_dir: target_dir.into(),
            collision,
        }
    }

    /// Sink writing into `<output_dir>/<app_folder>/`
    pub fn from_config(config: &OutputConfig) -> Self {
        Self::new(config.target_dir(), config.file_collision)
    }

    /// Directory files are written into
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}

#[async_trait]
impl FileSink for DirectorySink {
    async fn write(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DownloadError> {
        validate_file_name(file_name)?;

        tokio::fs::create_dir_all(&self.target_dir)
            .await
            .map_err(|source| DownloadError::WriteFailed {
                file_name: file_name.to_string(),
                source,
            })?;

        let path = get_unique_path(&self.target_dir.join(file_name), self.collision)?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| DownloadError::WriteFailed {
                file_name: file_name.to_string(),
                source,
            })?;

        debug!(
            path = %path.display(),
            mime_type,
            bytes = bytes.len(),
            "wrote converted file"
        );

        Ok(path)
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}
