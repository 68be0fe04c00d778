//! Stand-in collaborators reachable through the public traits

use async_trait::async_trait;
use format_shifter::{CodecCapabilities, ConversionError, ImageCodec, ImageFormat};
use std::sync::Mutex;

/// Marker that makes [`TaggingCodec`] fail the conversion
pub const UNREADABLE: &[u8] = b"unreadable";

/// Codec that prefixes the input with the target extension
///
/// Input containing [`UNREADABLE`] fails like a decoder would.
#[derive(Default)]
pub struct TaggingCodec {
    qualities: Mutex<Vec<u32>>,
}

impl TaggingCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quality of every call, in call order
    pub fn qualities(&self) -> Vec<u32> {
        self.qualities.lock().unwrap().clone()
    }
}

pub fn tagged(format: ImageFormat, input: &[u8]) -> Vec<u8> {
    [format.extension().as_bytes(), b":", input].concat()
}

#[async_trait]
impl ImageCodec for TaggingCodec {
    async fn convert(
        &self,
        input: &[u8],
        input_format: ImageFormat,
        output_format: ImageFormat,
        quality: u32,
    ) -> Result<Vec<u8>, ConversionError> {
        self.qualities.lock().unwrap().push(quality);
        if input.windows(UNREADABLE.len()).any(|w| w == UNREADABLE) {
            return Err(ConversionError::decode(input_format, "invalid box header"));
        }
        Ok(tagged(output_format, input))
    }

    fn capabilities(&self) -> CodecCapabilities {
        CodecCapabilities {
            can_convert: true,
            applies_orientation: false,
        }
    }

    fn name(&self) -> &'static str {
        "tagging"
    }
}
