// THEORY:
// Coordinate types shared by the scanner, the mapper and the pipeline. The two
// point types are kept distinct so an image-space point can never be handed to
// the presentation layer without passing through the `CoordinateMapper`.

use std::ops::Mul;

/// Width and height of a coordinate space (a sensor frame or a display surface).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    pub width: f64,
    pub height: f64,
}

impl Resolution {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Resolution of a pixel grid.
    pub fn from_pixels(width: u32, height: u32) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// A location in sensor-image space, already axis-swapped for the 90° rotation
/// between sensor and display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImagePoint {
    pub x: f64,
    pub y: f64,
}

impl ImagePoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl Mul<f64> for ImagePoint {
    type Output = ImagePoint;

    fn mul(self, rhs: f64) -> Self::Output {
        ImagePoint::new(self.x * rhs, self.y * rhs)
    }
}

/// A location in display space, in the display surface's own units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

impl DisplayPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when the point lies on the display surface, edges included.
    pub fn is_within(&self, display: Resolution) -> bool {
        (0.0..=display.width).contains(&self.x) && (0.0..=display.height).contains(&self.y)
    }
}

impl Mul<f64> for DisplayPoint {
    type Output = DisplayPoint;

    fn mul(self, rhs: f64) -> Self::Output {
        DisplayPoint::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_display_includes_edges() {
        let display = Resolution::new(393.0, 852.0);
        assert!(DisplayPoint::new(0.0, 0.0).is_within(display));
        assert!(DisplayPoint::new(393.0, 852.0).is_within(display));
        assert!(!DisplayPoint::new(393.5, 10.0).is_within(display));
        assert!(!DisplayPoint::new(10.0, -1.0).is_within(display));
    }
}
