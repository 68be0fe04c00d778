//! File picker collaborators
//!
//! A [`FilePicker`] produces the [`SelectedFile`]s a batch is built from.
//! Cancellation by the user is an empty list, not an error.
//!
//! - [`PathPicker`]: selects from paths supplied up front (command line, drag-and-drop, ...)

mod paths;

pub use paths::PathPicker;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::SelectedFile;

/// Lets the user choose source images
#[async_trait]
pub trait FilePicker: Send + Sync {
    /// Select images; at most one when `allow_multiple` is false
    async fn select_images(&self, allow_multiple: bool) -> Result<Vec<SelectedFile>>;
}
