// THEORY:
// The `Block` module describes the spatial grouping the scanner works in. A block
// is never materialized: there is no vector of pixels per block, only arithmetic
// that says where a block starts and where its center lies.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: Grouping pixels into (by default) 10x10 tiles turns a
//     two-megapixel frame into roughly twenty thousand candidates, and makes the
//     detection robust to single-pixel sensor noise.
// 2.  **Floor Partitioning**: A frame holds `floor(width / block_width)` by
//     `floor(height / block_height)` blocks. Remainder pixels on the right and
//     bottom edges are excluded, never padded or wrapped.
// 3.  **Block Centers**: Detections are always reported at a block center, computed
//     with integer halving of the block size.

pub mod block {
    use crate::error::{Result, VisionError};

    /// Dimensions of one scanning tile, in pixels.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct BlockSize {
        pub width: u32,
        pub height: u32,
    }

    impl Default for BlockSize {
        fn default() -> Self {
            Self {
                width: 10,
                height: 10,
            }
        }
    }

    impl BlockSize {
        pub fn new(width: u32, height: u32) -> Result<Self> {
            if width == 0 || height == 0 {
                return Err(VisionError::InvalidBlockSize { width, height });
            }
            Ok(Self { width, height })
        }

        /// Number of pixels in one block.
        pub fn area(&self) -> u64 {
            self.width as u64 * self.height as u64
        }
    }

    /// The block partition of one frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockGrid {
        pub block: BlockSize,
        /// Blocks per row (frame width / block width, floored).
        pub grid_width: u32,
        /// Blocks per column (frame height / block height, floored).
        pub grid_height: u32,
    }

    impl BlockGrid {
        pub fn new(image_width: u32, image_height: u32, block: BlockSize) -> Self {
            Self {
                block,
                grid_width: image_width / block.width,
                grid_height: image_height / block.height,
            }
        }

        pub fn len(&self) -> usize {
            self.grid_width as usize * self.grid_height as usize
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Pixel coordinates of the top-left corner of block `(bx, by)`.
        #[inline]
        pub fn origin(&self, bx: u32, by: u32) -> (u32, u32) {
            (bx * self.block.width, by * self.block.height)
        }

        /// Pixel coordinates of the center of block `(bx, by)`.
        #[inline]
        pub fn center(&self, bx: u32, by: u32) -> (u32, u32) {
            let (x, y) = self.origin(bx, by);
            (x + self.block.width / 2, y + self.block.height / 2)
        }

        /// Row-major grid position of the block with linear index `index`.
        pub fn position(&self, index: usize) -> (u32, u32) {
            let grid_width = self.grid_width as usize;
            ((index % grid_width) as u32, (index / grid_width) as u32)
        }
    }
}
