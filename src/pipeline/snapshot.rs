//! Immutable batch snapshots

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::task::ConversionTask;
use crate::types::{BatchId, BatchProgress, Status, TaskId, TaskSummary};

/// Copy of a whole batch at one point in processing
///
/// Cloning is cheap: the task list is shared and task buffers are
/// reference-counted. Nothing inside a snapshot ever changes.
#[derive(Clone, Debug)]
pub struct BatchSnapshot {
    batch_id: BatchId,
    sequence: u64,
    taken_at: DateTime<Utc>,
    tasks: Arc<[ConversionTask]>,
}

impl BatchSnapshot {
    pub(crate) fn new(batch_id: BatchId, sequence: u64, tasks: Vec<ConversionTask>) -> Self {
        Self {
            batch_id,
            sequence,
            taken_at: Utc::now(),
            tasks: tasks.into(),
        }
    }

    /// Batch this snapshot belongs to
    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    /// Position of this snapshot among all snapshots of the batch (starts at 0)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the snapshot was taken
    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Tasks in submission order
    pub fn tasks(&self) -> &[ConversionTask] {
        &self.tasks
    }

    /// Number of tasks in the batch
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the batch has no tasks
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look up a task by ID
    pub fn task(&self, id: &TaskId) -> Option<&ConversionTask> {
        self.tasks.iter().find(|task| task.id() == id)
    }

    pub(crate) fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id() == id)
    }

    /// Per-status counts
    pub fn progress(&self) -> BatchProgress {
        BatchProgress::from_statuses(self.tasks.iter().map(ConversionTask::status))
    }

    /// Whether every task reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.progress().is_finished()
    }

    /// Tasks with converted output, in submission order
    pub fn completed(&self) -> Vec<ConversionTask> {
        self.tasks
            .iter()
            .filter(|task| task.status() == Status::Completed)
            .cloned()
            .collect()
    }

    /// Byte-free view of every task
    pub fn summaries(&self) -> Vec<TaskSummary> {
        self.tasks.iter().map(ConversionTask::summary).collect()
    }
}

impl PartialEq for BatchSnapshot {
    /// Same batch, same position, same task values; the timestamp is ignored
    fn eq(&self, other: &Self) -> bool {
        self.batch_id == other.batch_id
            && self.sequence == other.sequence
            && self.tasks == other.tasks
    }
}

impl Eq for BatchSnapshot {}
