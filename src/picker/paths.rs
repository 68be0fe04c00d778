//! Picker over a fixed list of filesystem paths

use super::FilePicker;
use crate::error::{Error, Result};
use crate::types::{ImageFormat, SelectedFile};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Extensions picked up when scanning a directory
const SCAN_EXTENSIONS: &[&str] = &["heic", "heif"];

/// Selects files from paths known ahead of time
///
/// Files are taken as given. Directories are scanned (non-recursively) for
/// `.heic`/`.heif` files in name order. An empty path list behaves like a
/// cancelled dialog.
///
/// # Examples
///
/// ```no_run
/// use format_shifter::picker::{FilePicker, PathPicker};
///
/// # #[tokio::main]
/// # async fn main() -> format_shifter::Result<()> {
/// let picker = PathPicker::new(std::env::args().skip(1));
/// let files = picker.select_images(true).await?;
/// println!("selected {} file(s)", files.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathPicker {
    paths: Vec<PathBuf>,
}

impl PathPicker {
    /// Picker over `paths`
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    async fn candidates(&self) -> Result<Vec<PathBuf>> {
        let mut candidates = Vec::new();
        for path in &self.paths {
            let metadata = tokio::fs::metadata(path)
                .await
                .map_err(|e| io_context(e, "Failed to inspect", path))?;
            if metadata.is_dir() {
                candidates.extend(scan_directory(path).await?);
            } else {
                candidates.push(path.clone());
            }
        }
        Ok(candidates)
    }
}

async fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| io_context(e, "Failed to read directory", dir))?;

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SCAN_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)));
        if matches && entry.file_type().await?.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn mime_for(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if ext.eq_ignore_ascii_case("heif") {
        return Some("image/heif".to_string());
    }
    ImageFormat::from_extension(ext).map(|format| format.mime_type().to_string())
}

fn io_context(e: std::io::Error, action: &str, path: &Path) -> Error {
    Error::Io(std::io::Error::new(
        e.kind(),
        format!("{} '{}': {}", action, path.display(), e),
    ))
}

#[async_trait]
impl FilePicker for PathPicker {
    async fn select_images(&self, allow_multiple: bool) -> Result<Vec<SelectedFile>> {
        let mut candidates = self.candidates().await?;
        if !allow_multiple {
            candidates.truncate(1);
        }

        let mut selected = Vec::with_capacity(candidates.len());
        for path in candidates {
            let data = tokio::fs::read(&path)
                .await
                .map_err(|e| io_context(e, "Failed to read", &path))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            selected.push(SelectedFile::new(name, mime_for(&path), data));
        }

        tracing::debug!(count = selected.len(), "files selected");
        Ok(selected)
    }
}
