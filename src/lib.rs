// THEORY:
// This file is the main entry point for the `lighthouse_vision` library crate.
// The public surface is the `VisionPipeline` (one frame in, one `Report` out) and
// the `FrameWorker` that runs it in the background with drop-newest backpressure.
//
// The building blocks live under `core_modules`: the `BrightnessScanner` that finds
// the brightest block of a frame and the `CoordinateMapper` that places that block
// on a display. They are public so callers can use either one on its own.
//
// Frame acquisition, preview rendering and marker animation belong to the caller.
// The engine never touches UI state; it returns values on the calling thread.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::brightness_scanner::{BrightnessScanner, LoggingObserver, ScanObserver, ScanOutcome};
pub use core_modules::coordinate_mapper::{CoordinateMapper, ScaleFactors, to_display};
pub use core_modules::pixel_buffer::{ChannelLayout, PixelBuffer};
pub use error::{Result, VisionError};
pub use pipeline::{PipelineConfig, Report, SpotData, VisionPipeline};
