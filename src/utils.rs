//! Utility functions for file names and output paths

use crate::config::FileCollisionAction;
use crate::error::DownloadError;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Everything before the last `.` of `name`, or the whole name if it has none
///
/// # Examples
///
/// ```
/// use format_shifter::utils::strip_extension;
///
/// assert_eq!(strip_extension("IMG_0001.heic"), "IMG_0001");
/// assert_eq!(strip_extension("a.b.heic"), "a.b");
/// assert_eq!(strip_extension("README"), "README");
/// ```
#[must_use]
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Reject names that would escape the output directory or are not plain file names
pub fn validate_file_name(name: &str) -> Result<(), DownloadError> {
    let reason = if name.is_empty() {
        Some("file name is empty")
    } else if name == "." || name == ".." {
        Some("file name refers to a directory")
    } else if name.contains(['/', '\\']) {
        Some("file name contains a path separator")
    } else if name.contains('\0') {
        Some("file name contains a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DownloadError::InvalidFileName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

/// Get a unique path for a file, handling collisions according to the specified action
///
/// # Arguments
///
/// * `path` - The desired file path
/// * `action` - How to handle file collisions
///
/// # Returns
///
/// Returns the final path to use. For Rename action, this may have a suffix added.
/// For Skip action, returns an error if the file already exists.
/// For Overwrite action, returns the original path unchanged.
///
/// # Examples
///
/// ```
/// use format_shifter::utils::get_unique_path;
/// use format_shifter::config::FileCollisionAction;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/photo_converted.png");
/// let unique = get_unique_path(path, FileCollisionAction::Rename).unwrap();
/// // If /tmp/photo_converted.png exists, returns /tmp/photo_converted (1).png
/// ```
pub fn get_unique_path(path: &Path, action: FileCollisionAction) -> Result<PathBuf, DownloadError> {
    let display_name = || {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    };

    match action {
        FileCollisionAction::Overwrite => Ok(path.to_path_buf()),
        FileCollisionAction::Skip => {
            if path.exists() {
                return Err(DownloadError::Rejected {
                    file_name: display_name(),
                    reason: "file already exists and collision action is Skip".to_string(),
                });
            }
            Ok(path.to_path_buf())
        }
        FileCollisionAction::Rename => {
            if !path.exists() {
                return Ok(path.to_path_buf());
            }

            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| DownloadError::InvalidFileName {
                    name: display_name(),
                    reason: "cannot extract file stem".to_string(),
                })?;
            let extension = path.extension().and_then(|e| e.to_str());
            let parent = path.parent().unwrap_or_else(|| Path::new(""));

            // Try adding (1), (2), (3), ... until we find a unique name
            for i in 1..=MAX_RENAME_ATTEMPTS {
                let new_name = match extension {
                    Some(ext) => format!("{} ({}).{}", stem, i, ext),
                    None => format!("{} ({})", stem, i),
                };
                let new_path = parent.join(new_name);
                if !new_path.exists() {
                    return Ok(new_path);
                }
            }

            Err(DownloadError::Rejected {
                file_name: display_name(),
                reason: format!(
                    "could not find unique filename after {} attempts",
                    MAX_RENAME_ATTEMPTS
                ),
            })
        }
    }
}
