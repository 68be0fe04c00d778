//! # format-shifter
//!
//! Batch HEIC to PNG/JPEG conversion with per-file status tracking.
//!
//! ## Design Philosophy
//!
//! format-shifter is designed to be:
//! - **Library-first** - No UI, the platform pieces sit behind traits
//! - **Failure-isolated** - One bad file never stops the rest of a batch
//! - **Event-driven** - Consumers subscribe to whole-batch snapshots, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use format_shifter::{Config, Event, FormatShifter, ImageFormat, PathPicker};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shifter = FormatShifter::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = shifter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let Event::Snapshot(snapshot) = event {
//!                 println!("{:.0}% done", snapshot.progress().fraction_done() * 100.0);
//!             }
//!         }
//!     });
//!
//!     let picker = PathPicker::new(["IMG_0001.heic", "IMG_0002.heic"]);
//!     let cancel = CancellationToken::new();
//!     if let Some(batch) = shifter
//!         .select_and_convert(&picker, Some(ImageFormat::Jpg), Some(85), &cancel)
//!         .await?
//!     {
//!         let summary = shifter.download_all(&batch).await;
//!         println!("saved {} files", summary.succeeded());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Result aggregation and downloads
pub mod aggregator;
/// Image codec abstraction
pub mod codec;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// File selection
pub mod picker;
/// Sequential conversion pipeline
pub mod pipeline;
/// Top-level facade
pub mod shifter;
/// File storage
pub mod sink;
/// Conversion task state machine
pub mod task;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use aggregator::{
    DownloadFailure, DownloadPayload, DownloadSummary, ResultAggregator, generate_file_name,
};
pub use codec::{CodecCapabilities, ImageCodec, MagickCodec, NoOpCodec};
pub use config::{Config, FileCollisionAction};
pub use error::{ConversionError, DownloadError, Error, Result};
pub use picker::{FilePicker, PathPicker};
pub use pipeline::{BatchSnapshot, ConversionPipeline};
pub use shifter::FormatShifter;
pub use sink::{DirectorySink, FileSink};
pub use task::ConversionTask;
pub use types::{
    BatchId, BatchProgress, Event, ImageFormat, SelectedFile, Status, TaskId, TaskSummary,
};

/// Cancel `token` when the process receives a termination signal
///
/// A running batch observes the token, finishes the conversion in flight and
/// dispatches nothing further.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use format_shifter::cancel_on_signal;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cancel = CancellationToken::new();
///     tokio::spawn(cancel_on_signal(cancel.clone()));
///     // pass `&cancel` to FormatShifter::convert
/// }
/// ```
pub async fn cancel_on_signal(token: tokio_util::sync::CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => token.cancel(),
        _ = token.cancelled() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, cancelling conversions"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, cancelling conversions"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT, cancelling conversions");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM, cancelling conversions");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, cancelling conversions"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}
