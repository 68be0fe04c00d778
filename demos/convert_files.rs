//! Convert HEIC files from the command line
//!
//! This example demonstrates the core functionality of format-shifter:
//! - Loading configuration (optionally from a JSON file)
//! - Picking files from paths given as arguments
//! - Subscribing to batch snapshots
//! - Cancelling on Ctrl+C
//! - Saving every converted file
//!
//! ```text
//! cargo run --example convert_files -- [--jpg] [--quality N] [--config FILE] <file-or-dir>...
//! RUST_LOG=format_shifter=debug cargo run --example convert_files -- ~/Pictures/iphone
//! ```

use std::path::PathBuf;

use format_shifter::{
    Config, Event, FormatShifter, ImageFormat, PathPicker, Status, cancel_on_signal,
    generate_file_name,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut format = None;
    let mut quality = None;
    let mut config_path: Option<PathBuf> = None;
    let mut paths = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--jpg" | "--jpeg" => format = Some(ImageFormat::Jpg),
            "--png" => format = Some(ImageFormat::Png),
            "--quality" => quality = args.next().map(|q| q.parse::<u32>()).transpose()?,
            "--config" => config_path = args.next().map(PathBuf::from),
            _ => paths.push(PathBuf::from(arg)),
        }
    }

    let config = match config_path {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    let shifter = FormatShifter::new(config)?;

    // Progress printer
    let mut events = shifter.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Snapshot(snapshot) => {
                    let progress = snapshot.progress();
                    for task in snapshot.tasks() {
                        if task.status() == Status::Failed {
                            println!(
                                "✗ {}: {}",
                                task.file_name(),
                                task.error_message().unwrap_or("unknown error")
                            );
                        }
                    }
                    println!(
                        "[{:>3.0}%] {} done, {} converting, {} waiting",
                        progress.fraction_done() * 100.0,
                        progress.terminal(),
                        progress.processing,
                        progress.pending
                    );
                }
                Event::BatchFinished {
                    completed, failed, ..
                } => {
                    println!("✓ Batch finished: {} converted, {} failed", completed, failed);
                }
                Event::BatchCancelled { remaining, .. } => {
                    println!("⚠ Cancelled, {} files not converted", remaining);
                }
            }
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let picker = PathPicker::new(paths);
    let Some(batch) = shifter
        .select_and_convert(&picker, format, quality, &cancel)
        .await?
    else {
        println!("No HEIC files selected");
        return Ok(());
    };

    for task in batch.completed() {
        println!(
            "  {} -> {}",
            task.file_name(),
            generate_file_name(task.file_name(), task.output_format())
        );
    }

    let summary = shifter.download_all(&batch).await;
    for path in &summary.saved {
        println!("Saved {}", path.display());
    }
    for failure in &summary.failures {
        println!("Could not save {}: {}", failure.file_name, failure.error);
    }

    Ok(())
}
