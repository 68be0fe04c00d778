//! Core types for format-shifter

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::pipeline::BatchSnapshot;

/// Image formats known to the converter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// High Efficiency Image Container (source format)
    Heic,
    /// Portable Network Graphics (lossless)
    #[default]
    Png,
    /// JPEG (lossy)
    Jpg,
}

impl ImageFormat {
    const ALL: [ImageFormat; 3] = [ImageFormat::Heic, ImageFormat::Png, ImageFormat::Jpg];

    /// Canonical file extension, without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Heic => "heic",
            ImageFormat::Png => "png",
            ImageFormat::Jpg => "jpg",
        }
    }

    /// Name shown to users
    pub fn display_name(&self) -> &'static str {
        match self {
            ImageFormat::Heic => "HEIC",
            ImageFormat::Png => "PNG",
            ImageFormat::Jpg => "JPEG",
        }
    }

    /// MIME type handed to file sinks
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Heic => "image/heic",
            ImageFormat::Png => "image/png",
            ImageFormat::Jpg => "image/jpeg",
        }
    }

    /// Whether the encoding discards information (quality is meaningful)
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageFormat::Jpg)
    }

    /// Case-insensitive lookup by canonical extension
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(extension))
    }

    /// Formats the converter can be asked to produce
    pub fn output_formats() -> [ImageFormat; 2] {
        [ImageFormat::Png, ImageFormat::Jpg]
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Unique identifier for a conversion task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for the task at `index` within a batch
    pub fn generate(index: usize) -> Self {
        Self(format!("task_{}_{}", rand::random::<u64>(), index))
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier for one batch submission
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub u64);

impl BatchId {
    /// Generate a fresh random batch identifier
    pub fn generate() -> Self {
        Self(rand::random())
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Conversion task status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Created and waiting for the pipeline
    Pending,
    /// Currently inside the codec
    Processing,
    /// Converted successfully
    Completed,
    /// Conversion failed
    Failed,
}

impl Status {
    /// Whether the pipeline has finished with this task
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }

    /// Whether `self -> next` is an edge of the task state machine
    pub fn can_transition_to(&self, next: Status) -> bool {
        matches!(
            (self, next),
            (Status::Pending, Status::Processing)
                | (Status::Processing, Status::Completed)
                | (Status::Processing, Status::Failed)
                | (Status::Failed, Status::Pending)
        )
    }
}

/// A file handed over by a [`FilePicker`](crate::picker::FilePicker)
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// File name, including extension
    pub name: String,
    /// Size in bytes as reported by the picker
    pub size: u64,
    /// MIME type, when the platform reported one
    pub mime_type: Option<String>,
    /// Raw file contents
    pub data: Arc<[u8]>,
}

impl SelectedFile {
    /// Build a selected file from in-memory bytes; size is taken from the data
    pub fn new(name: impl Into<String>, mime_type: Option<String>, data: impl Into<Arc<[u8]>>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            mime_type,
            data,
        }
    }
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime_type", &self.mime_type)
            .field("data_len", &self.data.len())
            .finish()
    }
}

/// Serializable view of a task without its byte buffers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    /// Task ID
    pub id: TaskId,
    /// Original file name
    pub file_name: String,
    /// Source format
    pub input_format: ImageFormat,
    /// Target format
    pub output_format: ImageFormat,
    /// Requested quality, as stored
    pub quality: u32,
    /// Current status
    pub status: Status,
    /// Size of the converted output in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_size: Option<usize>,
    /// Error message for failed tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Per-status task counts for one snapshot
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Number of tasks in the batch
    pub total: usize,
    /// Tasks waiting to start
    pub pending: usize,
    /// Tasks inside the codec
    pub processing: usize,
    /// Tasks converted successfully
    pub completed: usize,
    /// Tasks that failed
    pub failed: usize,
}

impl BatchProgress {
    /// Count statuses
    pub fn from_statuses(statuses: impl IntoIterator<Item = Status>) -> Self {
        let mut progress = Self::default();
        for status in statuses {
            progress.total += 1;
            match status {
                Status::Pending => progress.pending += 1,
                Status::Processing => progress.processing += 1,
                Status::Completed => progress.completed += 1,
                Status::Failed => progress.failed += 1,
            }
        }
        progress
    }

    /// Tasks that reached a terminal state
    pub fn terminal(&self) -> usize {
        self.completed + self.failed
    }

    /// Fraction of tasks in a terminal state (0.0 for an empty batch)
    pub fn fraction_done(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.terminal() as f32 / self.total as f32
        }
    }

    /// Whether every task reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.terminal() == self.total
    }
}

/// Event emitted by the conversion pipeline
#[derive(Clone, Debug)]
pub enum Event {
    /// Full batch state after a single-task transition (or at batch creation)
    Snapshot(BatchSnapshot),

    /// Every task of a batch run reached a terminal state
    BatchFinished {
        /// Batch ID
        batch_id: BatchId,
        /// Number of completed tasks
        completed: usize,
        /// Number of failed tasks
        failed: usize,
    },

    /// Dispatch stopped because the run was cancelled
    BatchCancelled {
        /// Batch ID
        batch_id: BatchId,
        /// Tasks handed to the codec before cancellation took effect
        dispatched: usize,
        /// Tasks never started
        remaining: usize,
    },
}

impl Event {
    /// The batch this event belongs to
    pub fn batch_id(&self) -> BatchId {
        match self {
            Event::Snapshot(snapshot) => snapshot.batch_id(),
            Event::BatchFinished { batch_id, .. } | Event::BatchCancelled { batch_id, .. } => {
                *batch_id
            }
        }
    }
}
