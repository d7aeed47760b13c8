pub mod image_helper {
    use crate::error::Result;
    use image::{ImageEncoder, Rgba, RgbaImage};
    use std::path::Path;

    /// Diameter of the highlight ring, in pixels.
    pub const MARKER_DIAMETER: u32 = 40;
    /// Stroke width of the highlight ring, in pixels.
    pub const MARKER_BORDER: u32 = 5;
    pub const MARKER_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Decodes any format `image` understands into an RGBA frame.
    pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbaImage> {
        Ok(image::open(path)?.to_rgba8())
    }

    /// Writes an RGBA frame as PNG.
    pub fn save(path: impl AsRef<Path>, frame: &RgbaImage) -> Result<()> {
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }

    /// Draws the red highlight ring centered on `center`, clipped to the frame.
    pub fn draw_marker(frame: &mut RgbaImage, center: (u32, u32)) {
        let outer = (MARKER_DIAMETER / 2) as i64;
        let inner = outer - MARKER_BORDER as i64;
        let (cx, cy) = (center.0 as i64, center.1 as i64);
        let (width, height) = (frame.width() as i64, frame.height() as i64);

        for y in (cy - outer).max(0)..(cy + outer + 1).min(height) {
            for x in (cx - outer).max(0)..(cx + outer + 1).min(width) {
                let d2 = (x - cx).pow(2) + (y - cy).pow(2);
                if d2 <= outer * outer && d2 > inner * inner {
                    frame.put_pixel(x as u32, y as u32, MARKER_COLOR);
                }
            }
        }
    }
}
