//! Traits and types for image codecs

use async_trait::async_trait;

use crate::error::ConversionError;
use crate::types::ImageFormat;

/// Capabilities of a codec implementation
#[derive(Debug, Clone, Copy)]
pub struct CodecCapabilities {
    /// Can convert at all
    pub can_convert: bool,
    /// Applies EXIF orientation so output is upright
    pub applies_orientation: bool,
}

/// Converts encoded image bytes from one format to another
///
/// Contract for implementations:
/// - Decode `input` as `input_format`, correct EXIF orientation (tags 1-8) so
///   the result is visually upright, then encode as `output_format`.
/// - `quality` arrives already clamped to 1..=100. Lossy encoders honour it;
///   lossless encoders ignore it and use maximum fidelity.
/// - Any failure (undecodable input, unsupported target, encode failure,
///   resource exhaustion) is a [`ConversionError`] with a readable message.
/// - Timeouts, if any, are the implementation's business.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Convert `input` from `input_format` to `output_format`
    async fn convert(
        &self,
        input: &[u8],
        input_format: ImageFormat,
        output_format: ImageFormat,
        quality: u32,
    ) -> Result<Vec<u8>, ConversionError>;

    /// Query capabilities of this codec
    fn capabilities(&self) -> CodecCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
