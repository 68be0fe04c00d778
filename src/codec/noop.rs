//! No-op codec for graceful degradation

use super::traits::{CodecCapabilities, ImageCodec};
use crate::error::ConversionError;
use crate::types::ImageFormat;
use async_trait::async_trait;

/// Codec used when no conversion backend is available
///
/// Every conversion fails with a message explaining how to enable one, so a
/// batch still runs to completion with every task `Failed`.
///
/// # Examples
///
/// ```
/// use format_shifter::codec::{ImageCodec, NoOpCodec};
/// use format_shifter::ImageFormat;
///
/// # #[tokio::main]
/// # async fn main() {
/// let codec = NoOpCodec;
/// let result = codec
///     .convert(b"...", ImageFormat::Heic, ImageFormat::Png, 90)
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpCodec;

#[async_trait]
impl ImageCodec for NoOpCodec {
    async fn convert(
        &self,
        _input: &[u8],
        input_format: ImageFormat,
        output_format: ImageFormat,
        _quality: u32,
    ) -> Result<Vec<u8>, ConversionError> {
        Err(ConversionError::new(format!(
            "{} to {} conversion requires the ImageMagick `magick` binary. \
             Configure tools.magick_path or ensure magick is in PATH.",
            input_format.display_name(),
            output_format.display_name()
        )))
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            can_convert: false,
            applies_orientation: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
