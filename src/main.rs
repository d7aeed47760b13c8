// This file is an example of how to use the `lighthouse_vision` library.
// The main library entry point is `src/lib.rs`.
//
// Usage: lighthouse_vision [input_image] [annotated_output.png]
// Without an input image a synthetic frame with one bright block is scanned.

use anyhow::Context;
use image::{Rgba, RgbaImage};
use lighthouse_vision::core_modules::utils::image_helper::image_helper::{draw_marker, load_frame, save};
use lighthouse_vision::{PipelineConfig, PixelBuffer, Report, VisionPipeline};

fn synthetic_frame() -> RgbaImage {
    let mut frame = RgbaImage::from_pixel(1080, 1920, Rgba([0, 0, 0, 255]));
    for y in 500..510 {
        for x in 1000..1010 {
            frame.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }
    frame
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut frame = match args.get(1) {
        Some(path) => load_frame(path).with_context(|| format!("failed to load {path}"))?,
        None => synthetic_frame(),
    };

    let pipeline = VisionPipeline::new(PipelineConfig::default())?;
    let report = pipeline.generate_report(&PixelBuffer::from_rgba_image(&frame));

    match report {
        Report::BrightSpot(spot) => {
            log::info!(
                "brightest block at ({}, {}), score {:.2}",
                spot.block_center.0,
                spot.block_center.1,
                spot.peak_score
            );
            log::info!(
                "display position ({:.1}, {:.1}){}",
                spot.display_point.x,
                spot.display_point.y,
                if spot.within_display { "" } else { " [outside display]" }
            );
            if let Some(output) = args.get(2) {
                draw_marker(&mut frame, spot.block_center);
                save(output, &frame).with_context(|| format!("failed to write {output}"))?;
                log::info!("annotated frame saved to {output}");
            }
        }
        Report::NoBrightSpot => log::info!("no bright point detected"),
    }

    Ok(())
}
