// THEORY:
// Errors in this crate are narrow on purpose: the scan itself is a pure computation
// over a validated view, so nothing can fail once a frame is inside the scanner.
// Everything that *can* go wrong is a construction-time problem: a buffer whose
// layout we cannot read safely, a block size of zero, or scale factors that would
// turn a coordinate into infinity or NaN. An undersized frame is not an error at
// all; it simply produces no detection.

use thiserror::Error;

/// Every fault the vision engine reports to its callers.
#[derive(Debug, Error)]
pub enum VisionError {
    /// The pixel layout cannot expose red, green and blue as 8-bit samples.
    #[error(
        "unsupported buffer layout: {bytes_per_pixel} bytes per pixel at {bits_per_component} bits per component (need >= 3 bytes at 8 bits)"
    )]
    UnsupportedBufferLayout {
        bytes_per_pixel: usize,
        bits_per_component: usize,
    },

    /// `bytes_per_row` is smaller than one row of pixels.
    #[error("bytes per row ({bytes_per_row}) is smaller than width * bytes per pixel ({row_bytes})")]
    RowStrideTooSmall { bytes_per_row: usize, row_bytes: usize },

    /// The byte slice does not cover the declared frame geometry.
    #[error("pixel data holds {actual} bytes but the frame geometry needs {expected}")]
    BufferTooShort { expected: usize, actual: usize },

    /// A block dimension of zero would never partition the frame.
    #[error("block size must be non-zero, got {width}x{height}")]
    InvalidBlockSize { width: u32, height: u32 },

    /// A scale factor that is zero, negative or not finite.
    #[error("invalid scale configuration: width scale {width_scale}, height scale {height_scale}")]
    InvalidScaleConfiguration { width_scale: f64, height_scale: f64 },

    /// A vertical extent that would turn the axis swap into NaN or infinity.
    #[error("invalid source vertical extent: {extent}")]
    InvalidVerticalExtent { extent: f64 },

    /// The background scan worker has shut down.
    #[error("frame worker is no longer running")]
    WorkerUnavailable,

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, VisionError>;
