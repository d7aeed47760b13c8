// THEORY:
// The `BrightnessScanner` reduces a full-resolution frame to a single coordinate:
// the center of the block whose accumulated brightness is highest.
//
// Key architectural principles:
// 1.  **Two-Level Grid Scan**: The outer loops walk block positions in row-major
//     order; the inner loops walk the pixels of one block. Every scanned pixel is
//     read exactly once, so the cost is O(width * height) regardless of block size.
// 2.  **Accumulate, Don't Average**: A block's score is the sum of its pixels'
//     normalized brightness. With a fixed block size the sum and the mean order
//     blocks identically; the sum is what callers see as the peak score.
// 3.  **First Maximum Wins**: The first block always becomes the candidate and a
//     later block replaces it only when strictly brighter. A uniform (even black)
//     frame therefore reports its top-left block.
// 4.  **Axis Swap**: The sensor is mounted 90 degrees off the display. The reported
//     point swaps axes: `x = source_vertical_extent - center_y`, `y = center_x`.
//     The extent is a configured constant, not the live frame height.
// 5.  **Quiet Hot Path**: No logging and no allocation inside the loops. Rows are
//     sliced once per block line and walked with `chunks_exact`; sums are `u64`
//     so even absurdly wide blocks cannot wrap. Timing is reported afterwards
//     through a `ScanObserver`.

use crate::core_modules::block::block::{BlockGrid, BlockSize};
use crate::core_modules::pixel::pixel::{Brightness, MAX_CHANNEL_SUM, channel_sum};
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::point::ImagePoint;
use std::time::{Duration, Instant};

/// Legacy far edge of the rotated sensor frame.
pub const DEFAULT_SOURCE_VERTICAL_EXTENT: f64 = 1080.0;

/// Receives per-scan diagnostics after the scan completes.
pub trait ScanObserver: Send + Sync {
    fn on_scan(&self, elapsed: Duration, peak_score: Option<Brightness>);
}

/// Observer that writes the scan time and peak score to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl ScanObserver for LoggingObserver {
    fn on_scan(&self, elapsed: Duration, peak_score: Option<Brightness>) {
        log::debug!(
            "brightness scan took {:.2} ms, peak score {:.2}",
            elapsed.as_secs_f64() * 1000.0,
            peak_score.unwrap_or(0.0)
        );
    }
}

/// The winning block of one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanOutcome {
    /// Axis-swapped block center in sensor-image space.
    pub image_point: ImagePoint,
    /// Block center in the buffer's own pixel coordinates (no axis swap).
    pub block_center: (u32, u32),
    /// Row-major index of the winning block.
    pub block_index: usize,
    /// Accumulated normalized brightness of the winning block.
    pub peak_score: Brightness,
}

/// Finds the brightest block of a frame.
#[derive(Debug, Clone, Copy)]
pub struct BrightnessScanner {
    block: BlockSize,
    source_vertical_extent: f64,
}

impl Default for BrightnessScanner {
    fn default() -> Self {
        Self::new(BlockSize::default(), DEFAULT_SOURCE_VERTICAL_EXTENT)
    }
}

impl BrightnessScanner {
    pub fn new(block: BlockSize, source_vertical_extent: f64) -> Self {
        Self {
            block,
            source_vertical_extent,
        }
    }

    pub fn block_size(&self) -> BlockSize {
        self.block
    }

    pub fn source_vertical_extent(&self) -> f64 {
        self.source_vertical_extent
    }

    /// The axis-swapped center of the brightest block, or `None` when the frame
    /// is smaller than one block.
    pub fn scan(&self, buffer: &PixelBuffer<'_>) -> Option<ImagePoint> {
        self.scan_detailed(buffer).map(|outcome| outcome.image_point)
    }

    /// Like [`scan`](Self::scan), then hands elapsed time and peak score to `observer`.
    pub fn scan_observed(
        &self,
        buffer: &PixelBuffer<'_>,
        observer: &dyn ScanObserver,
    ) -> Option<ScanOutcome> {
        let start = Instant::now();
        let outcome = self.scan_detailed(buffer);
        observer.on_scan(start.elapsed(), outcome.map(|o| o.peak_score));
        outcome
    }

    /// Full result of a scan: winning block, its score and both coordinate forms.
    pub fn scan_detailed(&self, buffer: &PixelBuffer<'_>) -> Option<ScanOutcome> {
        let grid = BlockGrid::new(buffer.width(), buffer.height(), self.block);
        if grid.is_empty() {
            return None;
        }

        let (block_index, raw_sum) = brightest_block(buffer, &grid);
        let (bx, by) = grid.position(block_index);
        let (center_x, center_y) = grid.center(bx, by);

        Some(ScanOutcome {
            image_point: ImagePoint::new(
                self.source_vertical_extent - center_y as f64,
                center_x as f64,
            ),
            block_center: (center_x, center_y),
            block_index,
            peak_score: raw_sum as Brightness / MAX_CHANNEL_SUM,
        })
    }
}

/// Row-major index and raw channel sum of the brightest block of a non-empty grid.
fn brightest_block(buffer: &PixelBuffer<'_>, grid: &BlockGrid) -> (usize, u64) {
    let stride = buffer.layout().bytes_per_pixel;
    let block = grid.block;
    let mut best: Option<(usize, u64)> = None;

    for by in 0..grid.grid_height {
        for bx in 0..grid.grid_width {
            let (origin_x, origin_y) = grid.origin(bx, by);
            let mut total = 0u64;

            for dy in 0..block.height {
                let row = buffer.row_span(origin_x, origin_y + dy, block.width);
                for pixel in row.chunks_exact(stride) {
                    total += channel_sum(pixel) as u64;
                }
            }

            if best.is_none_or(|(_, peak)| total > peak) {
                let index = by as usize * grid.grid_width as usize + bx as usize;
                best = Some((index, total));
            }
        }
    }

    best.unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel_buffer::ChannelLayout;
    use approx::assert_relative_eq;
    use std::sync::Mutex;

    fn rgba_frame(width: u32, height: u32, fill: u8) -> Vec<u8> {
        let mut data = vec![fill; (width * height * 4) as usize];
        for alpha in data.iter_mut().skip(3).step_by(4) {
            *alpha = 255;
        }
        data
    }

    fn paint(data: &mut [u8], width: u32, x0: u32, y0: u32, w: u32, h: u32, rgb: [u8; 3]) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                let i = ((y * width + x) * 4) as usize;
                data[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }

    #[test]
    fn black_frame_reports_first_block() {
        let data = rgba_frame(40, 30, 0);
        let buffer = PixelBuffer::packed(&data, 40, 30, ChannelLayout::RGBA8).unwrap();
        let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
        assert_eq!(outcome.block_index, 0);
        assert_eq!(outcome.block_center, (5, 5));
        assert_eq!(outcome.image_point, ImagePoint::new(1080.0 - 5.0, 5.0));
        assert_relative_eq!(outcome.peak_score, 0.0);
    }

    #[test]
    fn uniform_frame_reports_first_block_for_any_dividing_size() {
        let data = rgba_frame(60, 60, 128);
        let buffer = PixelBuffer::packed(&data, 60, 60, ChannelLayout::RGBA8).unwrap();
        for size in [1, 2, 3, 4, 5, 6, 10, 12, 15, 20, 30, 60] {
            let scanner = BrightnessScanner::new(BlockSize::new(size, size).unwrap(), 1080.0);
            let outcome = scanner.scan_detailed(&buffer).unwrap();
            assert_eq!(outcome.block_index, 0, "block size {size}");
        }
    }

    #[test]
    fn single_bright_block_wins_anywhere() {
        let (width, height) = (50, 40);
        let grid = BlockGrid::new(width, height, BlockSize::default());
        for index in 0..grid.len() {
            let (bx, by) = grid.position(index);
            let (x0, y0) = grid.origin(bx, by);
            let mut data = rgba_frame(width, height, 20);
            paint(&mut data, width, x0, y0, 10, 10, [200, 200, 200]);
            let buffer = PixelBuffer::packed(&data, width, height, ChannelLayout::RGBA8).unwrap();

            let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
            assert_eq!(outcome.block_index, index);
            assert_eq!(outcome.block_center, (x0 + 5, y0 + 5));
        }
    }

    #[test]
    fn ties_keep_first_in_row_major_order() {
        let mut data = rgba_frame(30, 30, 0);
        paint(&mut data, 30, 20, 0, 10, 10, [90, 90, 90]);
        paint(&mut data, 30, 0, 10, 10, 10, [90, 90, 90]);
        let buffer = PixelBuffer::packed(&data, 30, 30, ChannelLayout::RGBA8).unwrap();
        let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
        assert_eq!(outcome.block_center, (25, 5));
    }

    #[test]
    fn score_accumulates_over_pixels() {
        let data = rgba_frame(10, 10, 255);
        let buffer = PixelBuffer::packed(&data, 10, 10, ChannelLayout::RGBA8).unwrap();
        let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
        assert_relative_eq!(outcome.peak_score, 100.0);
    }

    #[test]
    fn undersized_frame_has_no_point() {
        let data = rgba_frame(9, 20, 255);
        let buffer = PixelBuffer::packed(&data, 9, 20, ChannelLayout::RGBA8).unwrap();
        assert_eq!(BrightnessScanner::default().scan(&buffer), None);

        let empty = PixelBuffer::packed(&[], 0, 0, ChannelLayout::RGBA8).unwrap();
        assert_eq!(BrightnessScanner::default().scan(&empty), None);
    }

    #[test]
    fn remainder_pixels_are_never_read() {
        // Only the top-left 10x10 block fits; everything outside it is white.
        let mut data = rgba_frame(15, 15, 255);
        paint(&mut data, 15, 0, 0, 10, 10, [0, 0, 0]);
        let buffer = PixelBuffer::packed(&data, 15, 15, ChannelLayout::RGBA8).unwrap();
        let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
        assert_eq!(outcome.block_center, (5, 5));
        assert_relative_eq!(outcome.peak_score, 0.0);
    }

    #[test]
    fn honours_row_padding_and_rgb_layout() {
        // 20x10 RGB frame with 8 bytes of padding per row; the right block is brighter.
        let (width, height, bytes_per_row) = (20u32, 10u32, 68usize);
        let mut data = vec![0xFFu8; bytes_per_row * height as usize];
        for y in 0..height as usize {
            for x in 0..width as usize {
                let value = if x >= 10 { 50 } else { 10 };
                let i = y * bytes_per_row + x * 3;
                data[i..i + 3].copy_from_slice(&[value, value, value]);
            }
        }
        let buffer = PixelBuffer::new(&data, width, height, bytes_per_row, ChannelLayout::RGB8).unwrap();
        let outcome = BrightnessScanner::default().scan_detailed(&buffer).unwrap();
        assert_eq!(outcome.block_center, (15, 5));
    }

    #[test]
    fn very_wide_block_does_not_overflow() {
        // One block row of 5.7M white pixels sums past u32::MAX.
        let width = 5_700_000u32;
        let data = vec![255u8; width as usize * 3];
        let buffer = PixelBuffer::packed(&data, width, 1, ChannelLayout::RGB8).unwrap();
        let scanner = BrightnessScanner::new(BlockSize::new(width, 1).unwrap(), 1080.0);

        let outcome = scanner.scan_detailed(&buffer).unwrap();
        assert_eq!(outcome.block_center, (width / 2, 0));
        assert_relative_eq!(outcome.peak_score, width as f64);
    }

    #[test]
    fn scanning_is_repeatable() {
        let mut data = rgba_frame(80, 60, 10);
        paint(&mut data, 80, 30, 40, 10, 10, [10, 250, 10]);
        let buffer = PixelBuffer::packed(&data, 80, 60, ChannelLayout::RGBA8).unwrap();
        let scanner = BrightnessScanner::default();
        assert_eq!(scanner.scan_detailed(&buffer), scanner.scan_detailed(&buffer));
    }

    #[test]
    fn observer_sees_peak_score() {
        struct Recorder(Mutex<Vec<Option<Brightness>>>);
        impl ScanObserver for Recorder {
            fn on_scan(&self, _elapsed: Duration, peak_score: Option<Brightness>) {
                self.0.lock().unwrap().push(peak_score);
            }
        }

        let recorder = Recorder(Mutex::new(Vec::new()));
        let data = rgba_frame(10, 10, 255);
        let buffer = PixelBuffer::packed(&data, 10, 10, ChannelLayout::RGBA8).unwrap();
        let scanner = BrightnessScanner::default();
        scanner.scan_observed(&buffer, &recorder);

        let tiny = PixelBuffer::packed(&data, 5, 5, ChannelLayout::RGBA8).unwrap();
        scanner.scan_observed(&tiny, &recorder);

        let seen = recorder.0.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_relative_eq!(seen[0].unwrap(), 100.0);
        assert_eq!(seen[1], None);
    }
}
