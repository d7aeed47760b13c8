// THEORY:
// The `Pixel` module is the most fundamental unit of the vision system. It is a
// "dumb" data container for a single RGB sample plus the one heuristic the
// detector cares about: a normalized brightness proxy, (r + g + b) / (3 * 255).
//
// The scanner never materializes `Pixel`s on its hot path. It reads the three
// channel bytes directly and accumulates their integer sum (`channel_sum`), which
// keeps the inner loop free of float math. The division by `MAX_CHANNEL_SUM` is
// applied once per block, so the integer sum and the normalized score order blocks
// identically.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type Brightness = f64;

    /// Offsets of the red, green and blue samples inside one pixel's byte group.
    pub const RED_OFFSET: usize = 0;
    pub const GREEN_OFFSET: usize = 1;
    pub const BLUE_OFFSET: usize = 2;
    /// The minimum number of bytes a pixel needs to expose R, G and B.
    pub const RGB_CHANNELS: usize = 3;
    /// Channel sum of a pure white pixel: 3 * 255.
    pub const MAX_CHANNEL_SUM: Brightness = 765.0;

    /// A single RGB sample. Any alpha or padding byte is ignored.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// Normalized brightness in [0, 1]: the mean of the three channels over 255.
        pub fn brightness(&self) -> Brightness {
            (self.red as u32 + self.green as u32 + self.blue as u32) as Brightness / MAX_CHANNEL_SUM
        }
    }

    /// Sum of the R, G and B bytes at the start of `bytes`.
    ///
    /// `bytes` must hold at least `RGB_CHANNELS` entries. The scanner passes
    /// `chunks_exact` groups of a validated layout, so the index checks never fire.
    #[inline(always)]
    pub fn channel_sum(bytes: &[Byte]) -> u32 {
        bytes[RED_OFFSET] as u32 + bytes[GREEN_OFFSET] as u32 + bytes[BLUE_OFFSET] as u32
    }

    impl From<&[Byte]> for Pixel {
        fn from(bytes: &[Byte]) -> Self {
            if bytes.len() < RGB_CHANNELS {
                panic!("Cannot convert {} bytes into pixel.", bytes.len());
            }
            Pixel::new(bytes[RED_OFFSET], bytes[GREEN_OFFSET], bytes[BLUE_OFFSET])
        }
    }

    impl From<Pixel> for [Byte; RGB_CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            [pixel.red, pixel.green, pixel.blue]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;
    use approx::assert_relative_eq;

    #[test]
    fn white_is_full_brightness() {
        assert_relative_eq!(Pixel::new(255, 255, 255).brightness(), 1.0);
        assert_relative_eq!(Pixel::default().brightness(), 0.0);
    }

    #[test]
    fn brightness_is_channel_mean() {
        let pixel = Pixel::new(255, 0, 0);
        assert_relative_eq!(pixel.brightness(), 1.0 / 3.0);
    }

    #[test]
    fn from_bytes_ignores_alpha() {
        let bytes = [10u8, 20, 30, 99];
        let pixel = Pixel::from(&bytes[..]);
        assert_eq!(pixel, Pixel::new(10, 20, 30));
        assert_eq!(channel_sum(&bytes), 60);
    }

    #[test]
    #[should_panic]
    fn from_short_slice_panics() {
        let bytes = [1u8, 2];
        let _ = Pixel::from(&bytes[..]);
    }
}
