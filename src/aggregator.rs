//! Result aggregation and downloads
//!
//! Turns completed tasks into files through a [`FileSink`]. Output names are
//! derived with [`generate_file_name`], so the name shown next to a task and
//! the name written to disk are always the same.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{DownloadError, Result};
use crate::sink::FileSink;
use crate::task::ConversionTask;
use crate::types::{ImageFormat, TaskId};
use crate::utils::strip_extension;

/// Output file name for a converted image
///
/// Drops the text after the last `.` of `original` (nothing is dropped when
/// there is no `.`) and appends `_converted.<ext>`.
///
/// ```
/// use format_shifter::{ImageFormat, generate_file_name};
///
/// assert_eq!(generate_file_name("IMG_0042.HEIC", ImageFormat::Jpg), "IMG_0042_converted.jpg");
/// assert_eq!(generate_file_name("a.b.heic", ImageFormat::Png), "a.b_converted.png");
/// assert_eq!(generate_file_name("noext", ImageFormat::Png), "noext_converted.png");
/// ```
pub fn generate_file_name(original: &str, output_format: ImageFormat) -> String {
    format!(
        "{}_converted.{}",
        strip_extension(original),
        output_format.extension()
    )
}

/// One file to hand to the sink
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadPayload {
    /// File contents
    pub bytes: Arc<[u8]>,
    /// Name the file is stored under
    pub file_name: String,
    /// MIME type of the contents
    pub mime_type: String,
}

impl DownloadPayload {
    /// Payload for a task's converted output, `None` if there is none yet
    pub fn from_task(task: &ConversionTask) -> Option<Self> {
        let bytes = task.output_data()?;
        Some(Self {
            bytes: Arc::clone(bytes),
            file_name: generate_file_name(task.file_name(), task.output_format()),
            mime_type: task.output_format().mime_type().to_string(),
        })
    }
}

/// One file that could not be written
#[derive(Debug)]
pub struct DownloadFailure {
    /// Name the file would have been stored under
    pub file_name: String,
    /// Why the sink refused it
    pub error: DownloadError,
}

/// Outcome of a multi-file download
#[derive(Debug, Default)]
pub struct DownloadSummary {
    /// Files handed to the sink
    pub attempted: usize,
    /// Where each successful write landed, in request order
    pub saved: Vec<PathBuf>,
    /// Writes the sink rejected
    pub failures: Vec<DownloadFailure>,
}

impl DownloadSummary {
    /// Number of files written
    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }

    /// Whether every attempted write succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes converted results through a [`FileSink`]
#[derive(Clone)]
pub struct ResultAggregator {
    sink: Arc<dyn FileSink>,
}

impl ResultAggregator {
    /// Create an aggregator writing to `sink`
    pub fn new(sink: Arc<dyn FileSink>) -> Self {
        Self { sink }
    }

    /// The sink files are written to
    pub fn sink(&self) -> &Arc<dyn FileSink> {
        &self.sink
    }

    /// Write one task's output
    ///
    /// # Errors
    ///
    /// - [`DownloadError::MissingOutput`] if the task has no converted output
    /// - whatever the sink reports for the write
    pub async fn download_one(&self, task: &ConversionTask) -> Result<PathBuf> {
        let payload = DownloadPayload::from_task(task).ok_or_else(|| DownloadError::MissingOutput {
            task_id: task.id().clone(),
        })?;

        let path = self
            .sink
            .write(&payload.bytes, &payload.file_name, &payload.mime_type)
            .await
            .inspect_err(|e| {
                warn!(task_id = %task.id(), file_name = %payload.file_name, error = %e, "download failed");
            })?;

        debug!(task_id = %task.id(), path = %path.display(), "converted file saved");
        Ok(path)
    }

    /// Write the output of every task that has one
    ///
    /// Tasks without output are skipped without a write attempt. A failed
    /// write is logged and recorded, and the remaining files are still written.
    pub async fn download_many(&self, tasks: &[ConversionTask]) -> DownloadSummary {
        let payloads: Vec<_> = tasks.iter().filter_map(DownloadPayload::from_task).collect();
        let skipped = tasks.len() - payloads.len();
        if skipped > 0 {
            debug!(skipped, "tasks without output left out of download");
        }
        self.download_payloads(payloads).await
    }

    /// Write arbitrary payloads, in order, continuing past failures
    pub async fn download_payloads(
        &self,
        payloads: impl IntoIterator<Item = DownloadPayload>,
    ) -> DownloadSummary {
        let mut summary = DownloadSummary::default();

        for payload in payloads {
            summary.attempted += 1;
            match self
                .sink
                .write(&payload.bytes, &payload.file_name, &payload.mime_type)
                .await
            {
                Ok(path) => summary.saved.push(path),
                Err(error) => {
                    warn!(file_name = %payload.file_name, error = %error, "download failed, continuing");
                    summary.failures.push(DownloadFailure {
                        file_name: payload.file_name,
                        error,
                    });
                }
            }
        }

        info!(
            sink = self.sink.name(),
            attempted = summary.attempted,
            succeeded = summary.succeeded(),
            "download finished"
        );
        summary
    }

    /// File name `task` is saved under
    pub fn file_name_for(task: &ConversionTask) -> String {
        generate_file_name(task.file_name(), task.output_format())
    }

    /// IDs of the tasks [`download_many`](Self::download_many) would write
    pub fn downloadable(tasks: &[ConversionTask]) -> Vec<TaskId> {
        tasks
            .iter()
            .filter(|task| task.output_data().is_some())
            .map(|task| task.id().clone())
            .collect()
    }
}
