//! ImageMagick-based codec using an external binary

use super::traits::{CodecCapabilities, ImageCodec};
use crate::error::ConversionError;
use crate::types::ImageFormat;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Codec backed by the ImageMagick command line
///
/// Bytes go in on stdin and come back on stdout:
///
/// ```text
/// magick heic:- -auto-orient [-quality Q] jpg:-
/// ```
///
/// `-auto-orient` applies the EXIF orientation tag. `-quality` is only passed
/// for lossy targets. HEIC output is rejected up front.
///
/// # Examples
///
/// ```no_run
/// use format_shifter::codec::MagickCodec;
/// use std::path::PathBuf;
/// use std::time::Duration;
///
/// // Create with explicit path
/// let codec = MagickCodec::new(PathBuf::from("/usr/bin/magick"));
///
/// // Or auto-discover from PATH, with a per-call time limit
/// let codec = MagickCodec::from_path()
///     .expect("magick not found in PATH")
///     .with_timeout(Duration::from_secs(60));
/// ```
pub struct MagickCodec {
    binary_path: PathBuf,
    timeout: Option<Duration>,
}

impl MagickCodec {
    /// Create a new codec with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            timeout: None,
        }
    }

    /// Attempt to find ImageMagick in PATH
    ///
    /// Looks for `magick` (ImageMagick 7) first, then the legacy `convert`
    /// entry point on non-Windows systems.
    pub fn from_path() -> Option<Self> {
        let found = which::which("magick").ok();
        #[cfg(not(windows))]
        let found = found.or_else(|| which::which("convert").ok());
        found.map(Self::new)
    }

    /// Kill the conversion if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Path of the binary this codec runs
    pub fn binary_path(&self) -> &PathBuf {
        &self.binary_path
    }

    async fn run(&self, input: &[u8], args: Vec<String>) -> Result<Vec<u8>, ConversionError> {
        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ConversionError::with_source(
                    format!("Failed to execute {}: {}", self.binary_path.display(), e),
                    e,
                )
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ConversionError::new("Failed to open codec stdin"))?;

        let write_input = async move {
            let result = stdin.write_all(input).await;
            drop(stdin); // close stdin so the binary sees EOF
            result
        };

        let (write_result, output) = tokio::join!(write_input, child.wait_with_output());

        let output = output.map_err(|e| {
            ConversionError::with_source(format!("Failed to wait for codec: {}", e), e)
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = stderr.trim();
            return Err(ConversionError::new(if detail.is_empty() {
                format!("Image conversion failed ({})", output.status)
            } else {
                format!("Image conversion failed: {}", detail)
            }));
        }

        // A broken pipe with a successful exit means the binary stopped reading early
        write_result.map_err(|e| {
            ConversionError::with_source(format!("Failed to send image to codec: {}", e), e)
        })?;

        Ok(output.stdout)
    }
}

/// Command-line arguments for one conversion
fn build_args(input_format: ImageFormat, output_format: ImageFormat, quality: u32) -> Vec<String> {
    let mut args = vec![
        format!("{}:-", input_format.extension()),
        "-auto-orient".to_string(),
    ];
    if output_format.is_lossy() {
        args.push("-quality".to_string());
        args.push(quality.to_string());
    }
    args.push(format!("{}:-", output_format.extension()));
    args
}

#[async_trait]
impl ImageCodec for MagickCodec {
    async fn convert(
        &self,
        input: &[u8],
        input_format: ImageFormat,
        output_format: ImageFormat,
        quality: u32,
    ) -> Result<Vec<u8>, ConversionError> {
        if !ImageFormat::output_formats().contains(&output_format) {
            return Err(ConversionError::unsupported_format(output_format));
        }

        let args = build_args(input_format, output_format, quality);
        tracing::debug!(binary = %self.binary_path.display(), ?args, "running codec");

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(input, args))
                .await
                .map_err(|_| {
                    ConversionError::new(format!(
                        "Image conversion timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => self.run(input, args).await,
        }
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            can_convert: true,
            applies_orientation: true,
        }
    }

    fn name(&self) -> &'static str {
        "imagemagick"
    }
}
