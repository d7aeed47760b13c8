// THEORY:
// The `CoordinateMapper` converts an axis-swapped sensor-image point into a point
// on the display surface. It is plain ratio math: each axis is divided by the
// ratio between the source extent and the destination extent.
//
// The only thing that can go wrong is the configuration, so it is checked once:
// a scale factor that is zero, negative, NaN or infinite is rejected when the
// `ScaleFactors` are built. After that `to_display` is a total function.

use crate::core_modules::point::{DisplayPoint, ImagePoint, Resolution};
use crate::error::{Result, VisionError};

/// Legacy sensor resolution the axis swap and scaling were tuned for.
pub const DEFAULT_SOURCE_RESOLUTION: Resolution = Resolution::new(1080.0, 1920.0);
/// Legacy display resolution, in display points.
pub const DEFAULT_DISPLAY_RESOLUTION: Resolution = Resolution::new(393.0, 852.0);

/// Ratios converting image units into display units. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ScaleFactors {
    width_scale: f64,
    height_scale: f64,
}

impl ScaleFactors {
    pub fn new(width_scale: f64, height_scale: f64) -> Result<Self> {
        let valid = |s: f64| s.is_finite() && s > 0.0;
        if !valid(width_scale) || !valid(height_scale) {
            return Err(VisionError::InvalidScaleConfiguration {
                width_scale,
                height_scale,
            });
        }
        Ok(Self {
            width_scale,
            height_scale,
        })
    }

    /// `source / destination` on each axis.
    pub fn from_resolutions(source: Resolution, destination: Resolution) -> Result<Self> {
        Self::new(source.width / destination.width, source.height / destination.height)
    }

    /// The scale that leaves points untouched.
    pub fn identity() -> Self {
        Self {
            width_scale: 1.0,
            height_scale: 1.0,
        }
    }

    pub fn width_scale(&self) -> f64 {
        self.width_scale
    }

    pub fn height_scale(&self) -> f64 {
        self.height_scale
    }
}

/// Divides an image point by the scale factors.
pub fn to_display(point: ImagePoint, scale: ScaleFactors) -> DisplayPoint {
    DisplayPoint::new(point.x / scale.width_scale, point.y / scale.height_scale)
}

/// Maps image points onto one fixed display.
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    scale: ScaleFactors,
    display: Resolution,
}

impl CoordinateMapper {
    pub fn new(source: Resolution, display: Resolution) -> Result<Self> {
        Ok(Self {
            scale: ScaleFactors::from_resolutions(source, display)?,
            display,
        })
    }

    pub fn scale(&self) -> ScaleFactors {
        self.scale
    }

    pub fn display(&self) -> Resolution {
        self.display
    }

    pub fn to_display(&self, point: ImagePoint) -> DisplayPoint {
        to_display(point, self.scale)
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self {
            scale: ScaleFactors {
                width_scale: DEFAULT_SOURCE_RESOLUTION.width / DEFAULT_DISPLAY_RESOLUTION.width,
                height_scale: DEFAULT_SOURCE_RESOLUTION.height / DEFAULT_DISPLAY_RESOLUTION.height,
            },
            display: DEFAULT_DISPLAY_RESOLUTION,
        }
    }
}
