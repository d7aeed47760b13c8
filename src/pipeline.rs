// THEORY:
// The `pipeline` module is the top-level, per-frame API of the engine. It wires the
// two core components together: the `BrightnessScanner` turns a frame into an
// axis-swapped image point, and the `CoordinateMapper` turns that point into a
// display point. The result is a `Report` that a presentation layer can act on
// without knowing anything about blocks, strides or scale factors.
//
// The pipeline holds configuration only. It keeps no history between frames, so
// one instance can serve any number of frames and any number of threads.

use crate::core_modules::block::block::BlockSize;
use crate::core_modules::brightness_scanner::{
    BrightnessScanner, DEFAULT_SOURCE_VERTICAL_EXTENT, LoggingObserver, ScanObserver,
};
use crate::core_modules::coordinate_mapper::{
    CoordinateMapper, DEFAULT_DISPLAY_RESOLUTION, DEFAULT_SOURCE_RESOLUTION,
};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::error::{Result, VisionError};
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::pixel::pixel::Brightness;
pub use crate::core_modules::point::{DisplayPoint, ImagePoint, Resolution};

/// Configuration for the VisionPipeline. `Default` carries the legacy fixed
/// constants the detector has always shipped with.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    pub block_width: u32,
    pub block_height: u32,
    /// Sensor resolution the scale factors are derived from.
    pub source_resolution: Resolution,
    /// Display resolution the scale factors are derived from.
    pub display_resolution: Resolution,
    /// Far edge of the rotated frame, used by the axis swap.
    pub source_vertical_extent: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            block_width: 10,
            block_height: 10,
            source_resolution: DEFAULT_SOURCE_RESOLUTION,
            display_resolution: DEFAULT_DISPLAY_RESOLUTION,
            source_vertical_extent: DEFAULT_SOURCE_VERTICAL_EXTENT,
        }
    }
}

impl PipelineConfig {
    /// A configuration derived from the real frame and display sizes instead of
    /// the legacy constants. The frame is rotated 90 degrees onto the display, so
    /// the rotated frame's extents are `(frame.height, frame.width)`.
    pub fn derived(frame: Resolution, display: Resolution) -> Self {
        Self {
            source_resolution: Resolution::new(frame.height, frame.width),
            display_resolution: display,
            source_vertical_extent: frame.height,
            ..Self::default()
        }
    }
}

/// The detailed data package for a detected bright spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotData {
    pub image_point: ImagePoint,
    pub display_point: DisplayPoint,
    /// Block center in the frame's own pixel coordinates, for drawing overlays.
    pub block_center: (u32, u32),
    pub peak_score: Brightness,
    /// False when the display point lies outside the configured display.
    pub within_display: bool,
}

/// The primary output of the vision pipeline for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Report {
    NoBrightSpot,
    BrightSpot(SpotData),
}

impl Report {
    pub fn display_point(&self) -> Option<DisplayPoint> {
        match self {
            Report::BrightSpot(spot) => Some(spot.display_point),
            Report::NoBrightSpot => None,
        }
    }
}

/// The main, top-level struct for the vision engine.
#[derive(Clone)]
pub struct VisionPipeline {
    scanner: BrightnessScanner,
    mapper: CoordinateMapper,
    observer: Arc<dyn ScanObserver>,
    config: PipelineConfig,
}

impl VisionPipeline {
    /// Validates `config` and builds the pipeline. Fails on a zero block size, on
    /// extents that would produce non-positive scale factors, and on a vertical
    /// extent that is not finite.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let block = BlockSize::new(config.block_width, config.block_height)?;
        if !config.source_vertical_extent.is_finite() {
            return Err(VisionError::InvalidVerticalExtent {
                extent: config.source_vertical_extent,
            });
        }
        let mapper = CoordinateMapper::new(config.source_resolution, config.display_resolution)?;
        Ok(Self {
            scanner: BrightnessScanner::new(block, config.source_vertical_extent),
            mapper,
            observer: Arc::new(LoggingObserver),
            config,
        })
    }

    /// Replaces the default logging observer.
    pub fn with_observer(mut self, observer: Arc<dyn ScanObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bright_spot_detected(&self, frame: &PixelBuffer<'_>) -> bool {
        matches!(self.generate_report(frame), Report::BrightSpot(_))
    }

    pub fn generate_report(&self, frame: &PixelBuffer<'_>) -> Report {
        // Stage 1: Block Scan
        let Some(outcome) = self.scanner.scan_observed(frame, self.observer.as_ref()) else {
            log::debug!(
                "no bright spot: {}x{} frame holds no {}x{} block",
                frame.width(),
                frame.height(),
                self.config.block_width,
                self.config.block_height
            );
            return Report::NoBrightSpot;
        };

        // Stage 2: Display Mapping
        let display_point = self.mapper.to_display(outcome.image_point);
        let display = self.mapper.display();
        if !(0.0..=display.width).contains(&display_point.x) {
            log::warn!("x out of bounds: {:.1} not in [0, {}]", display_point.x, display.width);
        }
        if !(0.0..=display.height).contains(&display_point.y) {
            log::warn!("y out of bounds: {:.1} not in [0, {}]", display_point.y, display.height);
        }

        log::debug!(
            "brightest point at image ({:.1}, {:.1}) -> display ({:.1}, {:.1})",
            outcome.image_point.x,
            outcome.image_point.y,
            display_point.x,
            display_point.y
        );

        Report::BrightSpot(SpotData {
            image_point: outcome.image_point,
            display_point,
            block_center: outcome.block_center,
            peak_score: outcome.peak_score,
            within_display: display_point.is_within(display),
        })
    }
}
