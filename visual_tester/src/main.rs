use lighthouse_vision::core_modules::coordinate_mapper::DEFAULT_DISPLAY_RESOLUTION;
use lighthouse_vision::core_modules::point::Resolution;
use lighthouse_vision::{ChannelLayout, PipelineConfig, PixelBuffer, Report, VisionPipeline};
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::env;

fn main() -> opencv::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // --- 1. Argument Parsing & Setup ---
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        println!("Usage: visual_tester <input_video_path> <output_video_path> [--derived]");
        return Ok(());
    }
    let input_path = &args[1];
    let output_path = &args[2];
    let derived = args.iter().any(|a| a == "--derived");

    // --- 2. Video I/O Initialization ---
    let mut cap = VideoCapture::from_file(input_path, videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        return Err(opencv::Error::new(
            core::StsError,
            format!("cannot open video file {input_path}"),
        ));
    }

    let frame_width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
    let frame_height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
    let fps = cap.get(videoio::CAP_PROP_FPS)?;

    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
    let mut writer = VideoWriter::new(
        output_path,
        fourcc,
        fps,
        core::Size::new(frame_width as i32, frame_height as i32),
        true,
    )?;

    // --- 3. Vision Pipeline Initialization ---
    let config = if derived {
        PipelineConfig::derived(
            Resolution::from_pixels(frame_width, frame_height),
            DEFAULT_DISPLAY_RESOLUTION,
        )
    } else {
        PipelineConfig::default()
    };
    let pipeline = VisionPipeline::new(config)
        .map_err(|e| opencv::Error::new(core::StsBadArg, e.to_string()))?;

    // --- 4. Main Processing Loop ---
    let mut frame = Mat::default();
    let mut detections = 0u64;
    let mut out_of_bounds = 0u64;
    loop {
        match cap.read(&mut frame) {
            Ok(true) => {
                if frame.empty() {
                    break;
                }

                // --- 5. Frame Conversion & Pipeline Processing ---
                // Convert the OpenCV Mat (BGR) to an RGBA buffer for our pipeline.
                let mut rgba_frame = Mat::default();
                imgproc::cvt_color(&frame, &mut rgba_frame, imgproc::COLOR_BGR2RGBA, 0)?;
                let frame_buffer = rgba_frame.data_bytes()?;
                let view = PixelBuffer::packed(frame_buffer, frame_width, frame_height, ChannelLayout::RGBA8)
                    .map_err(|e| opencv::Error::new(core::StsBadSize, e.to_string()))?;

                let report = pipeline.generate_report(&view);

                // --- 6. Visualization ---
                let mut output_frame = frame.clone();
                if let Report::BrightSpot(spot) = report {
                    detections += 1;
                    if !spot.within_display {
                        out_of_bounds += 1;
                    }
                    let center = core::Point::new(spot.block_center.0 as i32, spot.block_center.1 as i32);
                    // Red ring, 40 px across with a 5 px stroke (BGR order).
                    imgproc::circle(
                        &mut output_frame,
                        center,
                        20,
                        Scalar::new(0.0, 0.0, 255.0, 0.0),
                        5,
                        imgproc::LINE_8,
                        0,
                    )?;
                }

                // --- 7. Write Output Frame ---
                writer.write(&output_frame)?;
            }
            Ok(false) => {
                // End of video
                break;
            }
            Err(e) => {
                log::error!("Error reading frame: {:?}", e);
                break;
            }
        }
    }

    log::info!(
        "Processing complete: {detections} detections, {out_of_bounds} outside the display. Output saved to {output_path}"
    );
    Ok(())
}
