//! Conversion pipeline
//!
//! Drives a batch of [`ConversionTask`]s through the codec one task at a time:
//! 1. Build one `Pending` HEIC task per selected file and publish the batch
//! 2. For each task in order: `Processing` → codec → `Completed` or `Failed`
//! 3. Publish a full [`BatchSnapshot`] after every single-task transition
//!
//! A failed conversion never stops the batch. Cancellation stops dispatch;
//! an in-flight codec call finishes, but nothing is published after it.
//! Retries work on the pipeline's own latest state of a batch, never on a
//! snapshot a caller happens to hold.

mod snapshot;


pub use snapshot::BatchSnapshot;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::ImageCodec;
use crate::error::{Error, Result};
use crate::task::ConversionTask;
use crate::types::{BatchId, Event, ImageFormat, SelectedFile, Status, TaskId};

/// Result of driving one task
enum Step {
    /// Task reached a terminal state and the snapshot was published
    Finished(BatchSnapshot),
    /// Cancelled while waiting for a conversion permit; task untouched
    NotStarted,
    /// Cancelled while the codec ran; snapshot holds the result but was not published
    Abandoned(BatchSnapshot),
}

/// Sequential batch converter
///
/// Cloneable; clones share the codec, the event channel, the conversion
/// permits and the batch table. The pipeline keeps the latest snapshot of
/// every batch it ran, and every change to a batch is applied to that
/// snapshot, so sequence numbers of a batch only ever grow.
#[derive(Clone)]
pub struct ConversionPipeline {
    codec: Arc<dyn ImageCodec>,
    event_tx: broadcast::Sender<Event>,
    permits: Arc<Semaphore>,
    batches: Arc<Mutex<HashMap<BatchId, BatchSnapshot>>>,
}

impl ConversionPipeline {
    /// Create a pipeline
    ///
    /// `max_concurrent` bounds codec calls in flight across all batches run
    /// through this pipeline (and its clones). Values below 1 are treated as 1.
    pub fn new(
        codec: Arc<dyn ImageCodec>,
        event_tx: broadcast::Sender<Event>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            codec,
            event_tx,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            batches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Subscribe to snapshots and batch events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// The codec this pipeline converts with
    pub fn codec(&self) -> &Arc<dyn ImageCodec> {
        &self.codec
    }

    /// Latest state of a batch run through this pipeline
    pub fn latest(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        self.batches().get(&batch_id).cloned()
    }

    /// Stop tracking a batch, returning its final state
    ///
    /// Afterwards the batch can no longer be retried.
    pub fn release(&self, batch_id: BatchId) -> Option<BatchSnapshot> {
        self.batches().remove(&batch_id)
    }

    /// Convert `files` to `output_format` at `quality`, in order
    ///
    /// Publishes the all-`Pending` batch first, then one snapshot per task
    /// transition. Returns the final state of the batch, or `None` for an
    /// empty selection (nothing is published in that case).
    ///
    /// When `cancel` fires, no further task is started. The returned snapshot
    /// then still includes the outcome of an in-flight conversion even though
    /// that outcome was never published.
    pub async fn run_batch(
        &self,
        files: &[SelectedFile],
        output_format: ImageFormat,
        quality: u32,
        cancel: &CancellationToken,
    ) -> Result<Option<BatchSnapshot>> {
        if files.is_empty() {
            debug!("empty selection, nothing to convert");
            return Ok(None);
        }

        let tasks = files
            .iter()
            .enumerate()
            .map(|(index, file)| ConversionTask::from_selected(index, file, output_format, quality))
            .collect();
        let batch_id = BatchId::generate();
        let total = files.len();

        info!(
            %batch_id,
            tasks = total,
            %output_format,
            quality,
            codec = self.codec.name(),
            "starting conversion batch"
        );

        let mut latest = BatchSnapshot::new(batch_id, 0, tasks);
        {
            let mut batches = self.batches();
            batches.insert(batch_id, latest.clone());
            self.emit(Event::Snapshot(latest.clone()));
        }

        for index in 0..total {
            if cancel.is_cancelled() {
                self.cancelled(batch_id, index, total - index);
                return Ok(Some(latest));
            }

            match self.process_task(batch_id, index, cancel).await? {
                Step::Finished(snapshot) => latest = snapshot,
                Step::NotStarted => {
                    self.cancelled(batch_id, index, total - index);
                    return Ok(Some(latest));
                }
                Step::Abandoned(snapshot) => {
                    self.cancelled(batch_id, index + 1, total - index - 1);
                    return Ok(Some(snapshot));
                }
            }
        }

        let progress = latest.progress();
        info!(
            %batch_id,
            completed = progress.completed,
            failed = progress.failed,
            "conversion batch finished"
        );
        self.emit(Event::BatchFinished {
            batch_id,
            completed: progress.completed,
            failed: progress.failed,
        });

        Ok(Some(latest))
    }

    /// Move a `Failed` task back to `Pending` and publish the batch
    ///
    /// The task is not converted again until [`reprocess`](Self::reprocess)
    /// is called for it.
    ///
    /// # Errors
    ///
    /// - [`Error::BatchNotFound`] if this pipeline does not track `batch_id`
    /// - [`Error::TaskNotFound`] if `id` is not part of the batch
    /// - [`Error::InvalidTransition`] if the task is not `Failed`
    pub fn reset(&self, batch_id: BatchId, id: &TaskId) -> Result<BatchSnapshot> {
        let index = self.position(batch_id, id)?;
        let snapshot = self.apply(batch_id, index, true, ConversionTask::reset_for_retry)?;
        debug!(%batch_id, task_id = %id, "task reset for retry");
        Ok(snapshot)
    }

    /// Convert a single `Pending` task of a tracked batch
    ///
    /// Follows the same steps as a batch run, publishing whole-batch snapshots.
    /// Returns the batch after the task reached a terminal state, or the
    /// unchanged batch if `cancel` fired before the conversion started.
    ///
    /// # Errors
    ///
    /// - [`Error::BatchNotFound`] if this pipeline does not track `batch_id`
    /// - [`Error::TaskNotFound`] if `id` is not part of the batch
    /// - [`Error::InvalidTransition`] if the task is not `Pending`
    pub async fn reprocess(
        &self,
        batch_id: BatchId,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<BatchSnapshot> {
        let index = self.position(batch_id, id)?;
        let current = self.current(batch_id)?;
        let status = current.tasks()[index].status();
        if status != Status::Pending {
            return Err(Error::InvalidTransition {
                id: id.clone(),
                from: status,
                to: Status::Processing,
            });
        }

        match self.process_task(batch_id, index, cancel).await? {
            Step::Finished(snapshot) | Step::Abandoned(snapshot) => Ok(snapshot),
            Step::NotStarted => self.current(batch_id),
        }
    }

    /// [`reset`](Self::reset) followed by [`reprocess`](Self::reprocess)
    pub async fn retry(
        &self,
        batch_id: BatchId,
        id: &TaskId,
        cancel: &CancellationToken,
    ) -> Result<BatchSnapshot> {
        self.reset(batch_id, id)?;
        self.reprocess(batch_id, id, cancel).await
    }

    async fn process_task(
        &self,
        batch_id: BatchId,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<Step> {
        // permits are never closed, so acquire() only fails after a close() nobody calls
        let _permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Step::NotStarted),
            permit = self.permits.acquire() => permit.map_err(|_| Error::Cancelled)?,
        };

        let snapshot = self.apply(batch_id, index, true, ConversionTask::start_processing)?;
        let processing = snapshot.tasks()[index].clone();
        debug!(
            %batch_id,
            task_id = %processing.id(),
            file_name = processing.file_name(),
            "converting"
        );

        let result = self
            .codec
            .convert(
                processing.input_data(),
                processing.input_format(),
                processing.output_format(),
                processing.codec_quality(),
            )
            .await;

        let outcome = match result {
            Ok(output) if output.is_empty() => {
                warn!(task_id = %processing.id(), "codec returned no data");
                Err("Image conversion produced no data".to_string())
            }
            Ok(output) => {
                debug!(task_id = %processing.id(), bytes = output.len(), "conversion completed");
                Ok(output)
            }
            Err(e) => {
                warn!(
                    task_id = %processing.id(),
                    file_name = processing.file_name(),
                    error = %e,
                    "conversion failed"
                );
                Err(e.to_string())
            }
        };
        let finish = move |task: &ConversionTask| match outcome {
            Ok(output) => task.complete(output),
            Err(message) => task.fail(message),
        };

        if cancel.is_cancelled() {
            return Ok(Step::Abandoned(self.apply(batch_id, index, false, finish)?));
        }
        Ok(Step::Finished(self.apply(batch_id, index, true, finish)?))
    }

    /// Replace task `index` of the tracked batch with `change(task)`
    ///
    /// The new snapshot gets the next sequence number and, when `publish` is
    /// set, is sent while the table is still locked so subscribers receive a
    /// batch's snapshots in sequence order.
    fn apply<F>(
        &self,
        batch_id: BatchId,
        index: usize,
        publish: bool,
        change: F,
    ) -> Result<BatchSnapshot>
    where
        F: FnOnce(&ConversionTask) -> Result<ConversionTask>,
    {
        let mut batches = self.batches();
        let latest = batches
            .get(&batch_id)
            .ok_or(Error::BatchNotFound(batch_id))?;

        let mut tasks = latest.tasks().to_vec();
        tasks[index] = change(&tasks[index])?;
        let snapshot = BatchSnapshot::new(batch_id, latest.sequence() + 1, tasks);
        batches.insert(batch_id, snapshot.clone());

        if publish {
            self.emit(Event::Snapshot(snapshot.clone()));
        }
        Ok(snapshot)
    }

    fn current(&self, batch_id: BatchId) -> Result<BatchSnapshot> {
        self.latest(batch_id).ok_or(Error::BatchNotFound(batch_id))
    }

    fn position(&self, batch_id: BatchId, id: &TaskId) -> Result<usize> {
        self.current(batch_id)?
            .position(id)
            .ok_or_else(|| Error::TaskNotFound(id.clone()))
    }

    fn batches(&self) -> MutexGuard<'_, HashMap<BatchId, BatchSnapshot>> {
        // entries are replaced whole, so a poisoned table is still consistent
        self.batches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancelled(&self, batch_id: BatchId, dispatched: usize, remaining: usize) {
        info!(%batch_id, dispatched, remaining, "conversion batch cancelled");
        self.emit(Event::BatchCancelled {
            batch_id,
            dispatched,
            remaining,
        });
    }

    fn emit(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}
