//! Conversion task and its state machine.
//!
//! Tasks are values. Every transition returns a new [`ConversionTask`], leaving
//! the original untouched, so snapshots held by observers never change under them.
//!
//! ```text
//! Pending ──> Processing ──> Completed
//!    ^             │
//!    │             └───────> Failed
//!    └──── (retry) ───────────┘
//! ```

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ImageFormat, SelectedFile, Status, TaskId, TaskSummary};

/// Lowest quality handed to a codec
pub const MIN_QUALITY: u32 = 1;
/// Highest quality handed to a codec
pub const MAX_QUALITY: u32 = 100;

/// One file's conversion job
///
/// Equality compares every field, including buffer contents. Use [`id`](Self::id)
/// as the identity key.
#[derive(Clone, PartialEq, Eq)]
pub struct ConversionTask {
    id: TaskId,
    file_name: String,
    input_format: ImageFormat,
    output_format: ImageFormat,
    quality: u32,
    status: Status,
    input_data: Arc<[u8]>,
    output_data: Option<Arc<[u8]>>,
    error_message: Option<String>,
}

impl ConversionTask {
    /// Create a task in the `Pending` state
    pub fn new(
        id: TaskId,
        file_name: impl Into<String>,
        input_format: ImageFormat,
        output_format: ImageFormat,
        quality: u32,
        input_data: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            input_format,
            output_format,
            quality,
            status: Status::Pending,
            input_data: input_data.into(),
            output_data: None,
            error_message: None,
        }
    }

    /// Create the pending HEIC task for the file at `index` of a batch
    pub fn from_selected(
        index: usize,
        file: &SelectedFile,
        output_format: ImageFormat,
        quality: u32,
    ) -> Self {
        Self::new(
            TaskId::generate(index),
            file.name.clone(),
            ImageFormat::Heic,
            output_format,
            quality,
            Arc::clone(&file.data),
        )
    }

    /// Task ID
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// Original file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Source format
    pub fn input_format(&self) -> ImageFormat {
        self.input_format
    }

    /// Target format
    pub fn output_format(&self) -> ImageFormat {
        self.output_format
    }

    /// Quality exactly as requested
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// Quality clamped to the range codecs accept
    pub fn codec_quality(&self) -> u32 {
        self.quality.clamp(MIN_QUALITY, MAX_QUALITY)
    }

    /// Current status
    pub fn status(&self) -> Status {
        self.status
    }

    /// Source bytes
    pub fn input_data(&self) -> &Arc<[u8]> {
        &self.input_data
    }

    /// Converted bytes, present only when `Completed`
    pub fn output_data(&self) -> Option<&Arc<[u8]>> {
        self.output_data.as_ref()
    }

    /// Failure message, present only when `Failed`
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// `Pending -> Processing`
    pub fn start_processing(&self) -> Result<Self> {
        self.transition(Status::Processing, None, None)
    }

    /// `Processing -> Completed`, attaching the converted bytes
    pub fn complete(&self, output: impl Into<Arc<[u8]>>) -> Result<Self> {
        self.transition(Status::Completed, Some(output.into()), None)
    }

    /// `Processing -> Failed`, attaching the error message
    pub fn fail(&self, message: impl Into<String>) -> Result<Self> {
        self.transition(Status::Failed, None, Some(message.into()))
    }

    /// `Failed -> Pending`; the task keeps its ID and input
    pub fn reset_for_retry(&self) -> Result<Self> {
        self.transition(Status::Pending, None, None)
    }

    /// Byte-free view of the task
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            file_name: self.file_name.clone(),
            input_format: self.input_format,
            output_format: self.output_format,
            quality: self.quality,
            status: self.status,
            output_size: self.output_data.as_ref().map(|data| data.len()),
            error_message: self.error_message.clone(),
        }
    }

    fn transition(
        &self,
        next: Status,
        output_data: Option<Arc<[u8]>>,
        error_message: Option<String>,
    ) -> Result<Self> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }

        Ok(Self {
            status: next,
            output_data,
            error_message,
            ..self.clone()
        })
    }
}

impl std::fmt::Debug for ConversionTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionTask")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("quality", &self.quality)
            .field("status", &self.status)
            .field("input_len", &self.input_data.len())
            .field("output_len", &self.output_data.as_ref().map(|data| data.len()))
            .field("error_message", &self.error_message)
            .finish()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> ConversionTask {
        ConversionTask::new(
            TaskId::new("task_1_0"),
            "IMG_0001.heic",
            ImageFormat::Heic,
            ImageFormat::Jpg,
            80,
            vec![1u8, 2, 3],
        )
    }

    /// Exactly one of output/error for terminal states, neither otherwise
    fn assert_payload_invariant(task: &ConversionTask) {
        let has_output = task.output_data().is_some();
        let has_error = task.error_message().is_some();
        if task.status().is_terminal() {
            assert!(has_output ^ has_error, "terminal task {:?}", task);
        } else {
            assert!(!has_output && !has_error, "non-terminal task {:?}", task);
        }
    }

    #[test]
    fn new_task_is_pending_without_payload() {
        let task = pending();
        assert_eq!(task.status(), Status::Pending);
        assert_payload_invariant(&task);
    }

    #[test]
    fn happy_path_attaches_output() {
        let processing = pending().start_processing().unwrap();
        assert_eq!(processing.status(), Status::Processing);
        assert_payload_invariant(&processing);

        let done = processing.complete(vec![9u8, 9]).unwrap();
        assert_eq!(done.status(), Status::Completed);
        assert_eq!(done.output_data().unwrap().as_ref(), &[9u8, 9]);
        assert_payload_invariant(&done);
    }

    #[test]
    fn failure_attaches_message() {
        let failed = pending()
            .start_processing()
            .unwrap()
            .fail("Failed to decode input image")
            .unwrap();
        assert_eq!(failed.status(), Status::Failed);
        assert_eq!(failed.error_message(), Some("Failed to decode input image"));
        assert_payload_invariant(&failed);
    }

    #[test]
    fn transitions_leave_original_untouched() {
        let original = pending();
        let next = original.start_processing().unwrap();
        assert_eq!(original.status(), Status::Pending);
        assert_ne!(original, next);
        assert_eq!(original.id(), next.id());
    }

    #[test]
    fn retry_only_from_failed() {
        let task = pending();
        assert!(matches!(
            task.reset_for_retry(),
            Err(Error::InvalidTransition { from: Status::Pending, .. })
        ));

        let processing = task.start_processing().unwrap();
        assert!(processing.reset_for_retry().is_err());

        let completed = processing.complete(vec![1u8]).unwrap();
        assert!(matches!(
            completed.reset_for_retry(),
            Err(Error::InvalidTransition { from: Status::Completed, to: Status::Pending, .. })
        ));

        let failed = pending().start_processing().unwrap().fail("boom").unwrap();
        let reset = failed.reset_for_retry().unwrap();
        assert_eq!(reset.status(), Status::Pending);
        assert_eq!(reset.id(), failed.id());
        assert_eq!(reset.input_data(), failed.input_data());
        assert_payload_invariant(&reset);
    }

    #[test]
    fn cannot_skip_processing() {
        assert!(pending().complete(vec![1u8]).is_err());
        assert!(pending().fail("nope").is_err());
    }

    #[test]
    fn quality_is_clamped_for_codec_but_stored_unchanged() {
        let high = ConversionTask::new(
            TaskId::new("t"),
            "a.heic",
            ImageFormat::Heic,
            ImageFormat::Jpg,
            150,
            vec![1u8],
        );
        assert_eq!(high.quality(), 150);
        assert_eq!(high.codec_quality(), 100);

        let zero = ConversionTask::new(
            TaskId::new("t"),
            "a.heic",
            ImageFormat::Heic,
            ImageFormat::Png,
            0,
            vec![1u8],
        );
        assert_eq!(zero.quality(), 0);
        assert_eq!(zero.codec_quality(), 1);
    }

    #[test]
    fn equality_compares_buffer_contents() {
        let a = pending();
        let b = ConversionTask::new(
            TaskId::new("task_1_0"),
            "IMG_0001.heic",
            ImageFormat::Heic,
            ImageFormat::Jpg,
            80,
            vec![1u8, 2, 3],
        );
        assert_eq!(a, b);

        let c = ConversionTask::new(
            TaskId::new("task_1_0"),
            "IMG_0001.heic",
            ImageFormat::Heic,
            ImageFormat::Jpg,
            80,
            vec![1u8, 2, 4],
        );
        assert_ne!(a, c);
    }

    #[test]
    fn from_selected_builds_pending_heic_task() {
        let file = SelectedFile::new("photo.heic", Some("image/heic".into()), vec![7u8; 4]);
        let task = ConversionTask::from_selected(2, &file, ImageFormat::Png, 90);
        assert_eq!(task.status(), Status::Pending);
        assert_eq!(task.input_format(), ImageFormat::Heic);
        assert_eq!(task.output_format(), ImageFormat::Png);
        assert_eq!(task.file_name(), "photo.heic");
        assert_eq!(task.input_data().as_ref(), file.data.as_ref());
        assert!(task.id().as_str().ends_with("_2"));
    }

    #[test]
    fn summary_omits_bytes() {
        let done = pending()
            .start_processing()
            .unwrap()
            .complete(vec![0u8; 10])
            .unwrap();
        let summary = done.summary();
        assert_eq!(summary.output_size, Some(10));
        assert_eq!(summary.status, Status::Completed);
        assert!(summary.error_message.is_none());
    }
}
