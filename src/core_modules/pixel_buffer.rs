// THEORY:
// `PixelBuffer` is the read-only window through which the scanner sees a frame.
// It never owns pixel memory: the caller keeps the bytes for the duration of one
// scan and the borrow checker makes sure no view outlives them.
//
// All the checks that protect memory happen once, at construction. A buffer that
// exists is known to expose 8-bit R, G and B at offsets 0, 1 and 2 of every pixel
// group, and its byte slice is known to cover every row the geometry declares.
// After that the scanner can slice rows without re-validating anything per pixel.

use crate::core_modules::pixel::pixel::{Pixel, RGB_CHANNELS};
use crate::error::{Result, VisionError};
use image::{RgbImage, RgbaImage};

/// How the bytes of one pixel are arranged. Red, green and blue always sit at
/// offsets 0, 1 and 2; anything past them (alpha, padding) is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelLayout {
    /// Distance in bytes between the starts of two horizontally adjacent pixels.
    pub bytes_per_pixel: usize,
    /// Size of one sample. Only 8 is readable.
    pub bits_per_component: usize,
}

impl ChannelLayout {
    /// Packed R, G, B.
    pub const RGB8: ChannelLayout = ChannelLayout {
        bytes_per_pixel: 3,
        bits_per_component: 8,
    };
    /// R, G, B followed by alpha or a skipped byte.
    pub const RGBA8: ChannelLayout = ChannelLayout {
        bytes_per_pixel: 4,
        bits_per_component: 8,
    };

    pub fn validate(&self) -> Result<()> {
        if self.bits_per_component != 8 || self.bytes_per_pixel < RGB_CHANNELS {
            return Err(VisionError::UnsupportedBufferLayout {
                bytes_per_pixel: self.bytes_per_pixel,
                bits_per_component: self.bits_per_component,
            });
        }
        Ok(())
    }
}

/// A validated, borrowed view over decoded 8-bit RGB(A) pixel rows.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    bytes_per_row: usize,
    layout: ChannelLayout,
}

impl<'a> PixelBuffer<'a> {
    /// Wraps `data` as a frame of `width` x `height` pixels whose rows start every
    /// `bytes_per_row` bytes. The final row only needs its pixel bytes, not the
    /// trailing stride padding.
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        bytes_per_row: usize,
        layout: ChannelLayout,
    ) -> Result<Self> {
        layout.validate()?;

        // Geometry no slice could ever satisfy is reported as a short buffer.
        let too_short = || VisionError::BufferTooShort {
            expected: usize::MAX,
            actual: data.len(),
        };

        let row_bytes = (width as usize)
            .checked_mul(layout.bytes_per_pixel)
            .ok_or_else(too_short)?;
        if bytes_per_row < row_bytes {
            return Err(VisionError::RowStrideTooSmall {
                bytes_per_row,
                row_bytes,
            });
        }

        let expected = match height {
            0 => 0,
            h => (h as usize - 1)
                .checked_mul(bytes_per_row)
                .and_then(|rows| rows.checked_add(row_bytes))
                .ok_or_else(too_short)?,
        };
        if data.len() < expected {
            return Err(VisionError::BufferTooShort {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            bytes_per_row,
            layout,
        })
    }

    /// A frame with no row padding: `bytes_per_row == width * bytes_per_pixel`.
    pub fn packed(data: &'a [u8], width: u32, height: u32, layout: ChannelLayout) -> Result<Self> {
        let bytes_per_row = (width as usize)
            .checked_mul(layout.bytes_per_pixel)
            .unwrap_or(usize::MAX);
        Self::new(data, width, height, bytes_per_row, layout)
    }

    pub fn from_rgba_image(image: &'a RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.as_raw(),
            width,
            height,
            bytes_per_row: width as usize * 4,
            layout: ChannelLayout::RGBA8,
        }
    }

    pub fn from_rgb_image(image: &'a RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.as_raw(),
            width,
            height,
            bytes_per_row: width as usize * 3,
            layout: ChannelLayout::RGB8,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// `len` bytes of row `y` starting at pixel column `x`. For any in-frame span
    /// the end offset is at most the checked `expected` length from `new`, so
    /// this arithmetic cannot overflow.
    #[inline(always)]
    pub(crate) fn row_span(&self, x: u32, y: u32, pixels: u32) -> &'a [u8] {
        let stride = self.layout.bytes_per_pixel;
        let start = y as usize * self.bytes_per_row + x as usize * stride;
        &self.data[start..start + pixels as usize * stride]
    }

    /// The pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Pixel> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(Pixel::from(self.row_span(x, y, 1)))
    }
}
