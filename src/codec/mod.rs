//! Image codec collaborators
//!
//! The pipeline never touches pixels. It hands bytes to an [`ImageCodec`] and
//! gets bytes (or a [`ConversionError`](crate::error::ConversionError)) back.
//!
//! ## Implementations
//!
//! - [`MagickCodec`]: pipes bytes through an external ImageMagick binary
//! - [`NoOpCodec`]: stub used when no codec is available; every conversion fails
//!
//! ## Usage
//!
//! ```no_run
//! use format_shifter::codec::{ImageCodec, MagickCodec};
//! use format_shifter::ImageFormat;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let codec = MagickCodec::from_path().expect("magick binary not found");
//!     let heic = std::fs::read("IMG_0001.heic")?;
//!     let jpeg = codec
//!         .convert(&heic, ImageFormat::Heic, ImageFormat::Jpg, 85)
//!         .await?;
//!     std::fs::write("IMG_0001.jpg", jpeg)?;
//!     Ok(())
//! }
//! ```

mod cli;
mod noop;
mod traits;

pub use cli::MagickCodec;
pub use noop::NoOpCodec;
pub use traits::{CodecCapabilities, ImageCodec};
