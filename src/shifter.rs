//! Top-level entry point wiring codec, pipeline, aggregator and events together

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::aggregator::{DownloadSummary, ResultAggregator};
use crate::codec::{ImageCodec, MagickCodec, NoOpCodec};
use crate::config::Config;
use crate::error::Result;
use crate::picker::FilePicker;
use crate::pipeline::{BatchSnapshot, ConversionPipeline};
use crate::sink::{DirectorySink, FileSink};
use crate::task::ConversionTask;
use crate::types::{Event, ImageFormat, SelectedFile};

/// HEIC conversion front end
///
/// Owns one [`ConversionPipeline`] and one [`ResultAggregator`]. Cloning is
/// cheap and clones share the event channel and conversion permits.
#[derive(Clone)]
pub struct FormatShifter {
    config: Arc<Config>,
    event_tx: broadcast::Sender<Event>,
    pipeline: ConversionPipeline,
    aggregator: ResultAggregator,
}

impl FormatShifter {
    /// Create a shifter with collaborators chosen from `config`
    ///
    /// The codec is `tools.magick_path` when set, otherwise ImageMagick found
    /// on PATH (when `tools.search_path` is on), otherwise [`NoOpCodec`], which
    /// fails every task with a message naming the missing binary. Files are
    /// written by a [`DirectorySink`] under `output.output_dir/output.app_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` does not validate.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let codec = select_codec(&config);
        let caps = codec.capabilities();
        tracing::info!(
            codec = codec.name(),
            can_convert = caps.can_convert,
            applies_orientation = caps.applies_orientation,
            "image codec initialized"
        );

        let sink = Arc::new(DirectorySink::from_config(&config.output));
        tracing::info!(
            sink = "directory",
            target_dir = %sink.target_dir().display(),
            "file sink initialized"
        );

        Ok(Self::assemble(config, codec, sink))
    }

    /// Create a shifter around caller-provided collaborators
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `config` does not validate.
    pub fn with_components(
        config: Config,
        codec: Arc<dyn ImageCodec>,
        sink: Arc<dyn FileSink>,
    ) -> Result<Self> {
        config.validate()?;
        tracing::info!(codec = codec.name(), sink = sink.name(), "using provided collaborators");
        Ok(Self::assemble(config, codec, sink))
    }

    fn assemble(config: Config, codec: Arc<dyn ImageCodec>, sink: Arc<dyn FileSink>) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.events.channel_capacity);
        let pipeline = ConversionPipeline::new(
            codec,
            event_tx.clone(),
            config.conversion.max_concurrent_conversions,
        );

        Self {
            config: Arc::new(config),
            event_tx,
            pipeline,
            aggregator: ResultAggregator::new(sink),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The pipeline batches run through
    pub fn pipeline(&self) -> &ConversionPipeline {
        &self.pipeline
    }

    /// The aggregator downloads go through
    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    /// Subscribe to snapshots and batch events
    ///
    /// Subscribe before starting a batch to see its first snapshot. A receiver
    /// that falls more than `events.channel_capacity` events behind gets
    /// `RecvError::Lagged` and skips ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Events as a [`Stream`], silently skipping over lag
    pub fn events_stream(&self) -> impl Stream<Item = Event> + Send + 'static {
        BroadcastStream::new(self.event_tx.subscribe()).filter_map(|event| match event {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::debug!(error = %e, "event subscriber lagged");
                None
            }
        })
    }

    /// Convert `files`, falling back to configured defaults
    ///
    /// Returns `None` for an empty selection.
    pub async fn convert(
        &self,
        files: &[SelectedFile],
        output_format: Option<ImageFormat>,
        quality: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Option<BatchSnapshot>> {
        let output_format = output_format.unwrap_or(self.config.conversion.default_output_format);
        let quality = quality.unwrap_or(self.config.conversion.default_quality);
        self.pipeline
            .run_batch(files, output_format, quality, cancel)
            .await
    }

    /// Ask `picker` for files and convert whatever it returns
    ///
    /// A picker that returns nothing (the user dismissed the dialog) yields
    /// `Ok(None)` without publishing anything.
    pub async fn select_and_convert(
        &self,
        picker: &dyn FilePicker,
        output_format: Option<ImageFormat>,
        quality: Option<u32>,
        cancel: &CancellationToken,
    ) -> Result<Option<BatchSnapshot>> {
        let files = picker.select_images(true).await?;
        tracing::debug!(selected = files.len(), "files picked");
        self.convert(&files, output_format, quality, cancel).await
    }

    /// Save one task's output, see [`ResultAggregator::download_one`]
    pub async fn download(&self, task: &ConversionTask) -> Result<PathBuf> {
        self.aggregator.download_one(task).await
    }

    /// Save every completed task of a batch, see [`ResultAggregator::download_many`]
    pub async fn download_all(&self, snapshot: &BatchSnapshot) -> DownloadSummary {
        self.aggregator.download_many(snapshot.tasks()).await
    }
}

fn select_codec(config: &Config) -> Arc<dyn ImageCodec> {
    let tools = &config.tools;
    let magick = if let Some(ref path) = tools.magick_path {
        Some(MagickCodec::new(path.clone()))
    } else if tools.search_path {
        MagickCodec::from_path()
    } else {
        None
    };

    match magick {
        Some(codec) => match tools.codec_timeout {
            Some(limit) => Arc::new(codec.with_timeout(limit)),
            None => Arc::new(codec),
        },
        None => {
            tracing::warn!("ImageMagick not available, conversions will fail until it is installed");
            Arc::new(NoOpCodec)
        }
    }
}
