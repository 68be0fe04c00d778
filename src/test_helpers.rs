//! Shared fakes for unit tests: a recording codec and an in-memory sink.

use crate::codec::{CodecCapabilities, ImageCodec};
use crate::error::{ConversionError, DownloadError};
use crate::sink::FileSink;
use crate::types::{Event, ImageFormat, SelectedFile};
use crate::pipeline::BatchSnapshot;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};

/// Input prefix the fake codec refuses to decode
pub(crate) const CORRUPT: &[u8] = b"corrupt";

/// One recorded codec invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodecCall {
    pub(crate) input: Vec<u8>,
    pub(crate) input_format: ImageFormat,
    pub(crate) output_format: ImageFormat,
    pub(crate) quality: u32,
}

/// Codec that tags the input instead of converting it
///
/// Output is `"<ext>:<quality>:" + input`. Empty input or input starting with
/// [`CORRUPT`] fails as a decode error.
#[derive(Default)]
pub(crate) struct FakeCodec {
    calls: Mutex<Vec<CodecCall>>,
    delay: Option<Duration>,
    gate: Option<Gate>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    empty_output: bool,
    fail_first: AtomicUsize,
}

/// Lets a test hold a conversion open until it decides to release it
#[derive(Default)]
pub(crate) struct Gate {
    pub(crate) started: Notify,
    pub(crate) release: Notify,
}

impl FakeCodec {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sleep inside every conversion
    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Block every conversion until the gate is released
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Gate::default()),
            ..Self::default()
        }
    }

    /// Succeed with zero bytes
    pub(crate) fn returning_empty() -> Self {
        Self {
            empty_output: true,
            ..Self::default()
        }
    }

    /// Fail the first `n` conversions regardless of input
    pub(crate) fn failing_first(n: usize) -> Self {
        Self {
            fail_first: AtomicUsize::new(n),
            ..Self::default()
        }
    }

    pub(crate) fn gate(&self) -> &Gate {
        self.gate.as_ref().expect("codec was not built with gated()")
    }

    pub(crate) fn calls(&self) -> Vec<CodecCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub(crate) fn fake_output(format: ImageFormat, quality: u32, input: &[u8]) -> Vec<u8> {
    let mut out = format!("{}:{}:", format.extension(), quality).into_bytes();
    out.extend_from_slice(input);
    out
}

#[async_trait]
impl ImageCodec for FakeCodec {
    async fn convert(
        &self,
        input: &[u8],
        input_format: ImageFormat,
        output_format: ImageFormat,
        quality: u32,
    ) -> Result<Vec<u8>, ConversionError> {
        self.calls.lock().unwrap().push(CodecCall {
            input: input.to_vec(),
            input_format,
            output_format,
            quality,
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self
            .fail_first
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ConversionError::new("transient codec failure"));
        }
        if input.is_empty() || input.starts_with(CORRUPT) {
            return Err(ConversionError::decode(input_format, "not a valid image"));
        }
        if self.empty_output {
            return Ok(Vec::new());
        }
        Ok(fake_output(output_format, quality, input))
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            can_convert: true,
            applies_orientation: false,
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// One file stored by [`MemorySink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredFile {
    pub(crate) file_name: String,
    pub(crate) mime_type: String,
    pub(crate) bytes: Vec<u8>,
}

/// Sink that keeps files in memory and fails on request
#[derive(Default)]
pub(crate) struct MemorySink {
    stored: Mutex<Vec<StoredFile>>,
    attempts: AtomicUsize,
    failing: HashSet<String>,
}

impl MemorySink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail writes for the given file names
    pub(crate) fn failing_on<I: IntoIterator<Item = &'static str>>(names: I) -> Self {
        Self {
            failing: names.into_iter().map(String::from).collect(),
            ..Self::default()
        }
    }

    pub(crate) fn stored(&self) -> Vec<StoredFile> {
        self.stored.lock().unwrap().clone()
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSink for MemorySink {
    async fn write(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> Result<PathBuf, DownloadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(file_name) {
            return Err(DownloadError::WriteFailed {
                file_name: file_name.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left"),
            });
        }
        self.stored.lock().unwrap().push(StoredFile {
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(PathBuf::from("memory").join(file_name))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// A HEIC file as a picker would hand it over
pub(crate) fn heic(name: &str, bytes: &[u8]) -> SelectedFile {
    SelectedFile::new(name, Some("image/heic".to_string()), bytes.to_vec())
}

/// Snapshots currently buffered on `rx`, ignoring other events
pub(crate) fn drain_snapshots(rx: &mut broadcast::Receiver<Event>) -> Vec<BatchSnapshot> {
    let mut snapshots = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let Event::Snapshot(snapshot) = event {
            snapshots.push(snapshot);
        }
    }
    snapshots
}

/// Every event currently buffered on `rx`
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
