//! Saving converted results through the directory sink

mod common;

use common::*;
use format_shifter::{
    ConversionTask, DirectorySink, DownloadError, Error, FileCollisionAction, ImageFormat,
    ResultAggregator, TaskId,
};
use std::sync::Arc;

fn converted(name: &str, format: ImageFormat, bytes: &[u8]) -> ConversionTask {
    ConversionTask::new(TaskId::new(format!("task_7_{name}")), name, ImageFormat::Heic, format, 90, b"in".to_vec())
        .start_processing()
        .unwrap()
        .complete(bytes.to_vec())
        .unwrap()
}

#[tokio::test]
async fn test_repeated_download_renames_instead_of_overwriting() {
    let ws = Workspace::new();
    let aggregator = ResultAggregator::new(Arc::new(DirectorySink::new(
        ws.target_dir(),
        FileCollisionAction::Rename,
    )));
    let task = converted("IMG_1.heic", ImageFormat::Png, b"png");

    let first = aggregator.download_one(&task).await.unwrap();
    let second = aggregator.download_one(&task).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(
        file_names(&ws.target_dir()),
        vec!["IMG_1_converted (1).png", "IMG_1_converted.png"]
    );
}

#[tokio::test]
async fn test_skip_policy_surfaces_rejection_for_single_download() {
    let ws = Workspace::new();
    let aggregator = ResultAggregator::new(Arc::new(DirectorySink::new(
        ws.target_dir(),
        FileCollisionAction::Skip,
    )));
    let task = converted("IMG_1.heic", ImageFormat::Jpg, b"jpg");

    aggregator.download_one(&task).await.unwrap();
    let err = aggregator.download_one(&task).await.unwrap_err();

    assert!(matches!(err, Error::Download(DownloadError::Rejected { .. })));
}

#[tokio::test]
async fn test_batch_download_counts_only_successful_writes() {
    let ws = Workspace::new();
    let aggregator = ResultAggregator::new(Arc::new(DirectorySink::new(
        ws.target_dir(),
        FileCollisionAction::Skip,
    )));
    let existing = converted("dup.heic", ImageFormat::Png, b"old");
    aggregator.download_one(&existing).await.unwrap();

    let tasks = vec![
        converted("dup.heic", ImageFormat::Png, b"new"),
        converted("fresh.heic", ImageFormat::Png, b"fresh"),
    ];
    let summary = aggregator.download_many(&tasks).await;

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.succeeded(), 1);
    assert_eq!(summary.failures[0].file_name, "dup_converted.png");
    assert_eq!(
        std::fs::read(ws.target_dir().join("dup_converted.png")).unwrap(),
        b"old"
    );
}
