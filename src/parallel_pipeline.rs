// THEORY:
// The scan is the most expensive step of the per-frame loop, so it runs off the
// thread that delivers frames. `FrameWorker` owns one capture stream's worth of
// background scanning with a strict backpressure policy: at most one scan is in
// flight, and a frame submitted while the worker is busy is dropped on the spot.
// A fresh detection is worth more than a complete one, so nothing is queued.
//
// Results come back through a channel. Whoever owns the display drains that
// channel on its own thread and can throw away results that have gone stale.
//
// `scan_frames` is the other shape of parallelism: a batch of independent frames
// fanned out over every core, results returned in input order.

use crate::core_modules::pixel_buffer::{ChannelLayout, PixelBuffer};
use crate::error::{Result, VisionError};
use crate::pipeline::{Report, VisionPipeline};
use futures::stream::{self, StreamExt};
use image::RgbaImage;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

const FRAME_POOL_SIZE: usize = 4;

/// An owned frame handed to a background scan.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub layout: ChannelLayout,
    pub frame_id: u64,
    pub captured_at: Instant,
}

impl Frame {
    /// Takes ownership of `data` after checking it against the declared geometry.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        bytes_per_row: usize,
        layout: ChannelLayout,
        frame_id: u64,
    ) -> Result<Self> {
        PixelBuffer::new(&data, width, height, bytes_per_row, layout)?;
        Ok(Self {
            data,
            width,
            height,
            bytes_per_row,
            layout,
            frame_id,
            captured_at: Instant::now(),
        })
    }

    pub fn from_rgba_image(image: RgbaImage, frame_id: u64) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            bytes_per_row: width as usize * 4,
            layout: ChannelLayout::RGBA8,
            frame_id,
            captured_at: Instant::now(),
        }
    }

    pub fn view(&self) -> Result<PixelBuffer<'_>> {
        PixelBuffer::new(&self.data, self.width, self.height, self.bytes_per_row, self.layout)
    }
}

/// The outcome of one background scan.
#[derive(Debug, Clone, Copy)]
pub struct FrameResult {
    pub frame_id: u64,
    pub report: Report,
    pub captured_at: Instant,
    pub completed_at: Instant,
}

impl FrameResult {
    /// Time from capture to the end of the scan.
    pub fn latency(&self) -> Duration {
        self.completed_at.duration_since(self.captured_at)
    }

    /// True when the frame was captured more than `max_age` ago.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.captured_at.elapsed() > max_age
    }
}

/// What happened to a submitted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Accepted(u64),
    /// A scan was already running; the frame was discarded.
    Dropped,
}

fn analyze(pipeline: &VisionPipeline, frame: &Frame) -> FrameResult {
    let report = match frame.view() {
        Ok(view) => pipeline.generate_report(&view),
        Err(err) => {
            log::error!("frame {} rejected by the scanner: {err}", frame.frame_id);
            Report::NoBrightSpot
        }
    };
    FrameResult {
        frame_id: frame.frame_id,
        report,
        captured_at: frame.captured_at,
        completed_at: Instant::now(),
    }
}

/// Background scanner for a single capture stream with drop-newest-on-busy
/// backpressure. Must be spawned inside a tokio runtime.
pub struct FrameWorker {
    task_sender: mpsc::UnboundedSender<Frame>,
    /// Never sent on; watched so `submit` notices a dropped result receiver.
    result_sender: mpsc::UnboundedSender<FrameResult>,
    busy: Arc<AtomicBool>,
    frame_counter: AtomicU64,
    dropped_frames: AtomicU64,
    frame_buffer_pool: Arc<Mutex<VecDeque<Vec<u8>>>>,
    worker: tokio::task::JoinHandle<()>,
}

impl FrameWorker {
    /// Starts the worker. Results arrive on the returned receiver.
    pub fn spawn(pipeline: VisionPipeline) -> (Self, mpsc::UnboundedReceiver<FrameResult>) {
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<Frame>();
        let (result_sender, result_receiver) = mpsc::unbounded_channel::<FrameResult>();
        let busy = Arc::new(AtomicBool::new(false));
        let frame_buffer_pool = Arc::new(Mutex::new(VecDeque::with_capacity(FRAME_POOL_SIZE)));

        let worker_results = result_sender.clone();
        let worker_busy = Arc::clone(&busy);
        let worker_pool = Arc::clone(&frame_buffer_pool);
        let worker = tokio::spawn(async move {
            log::info!("frame worker started");
            while let Some(frame) = task_receiver.recv().await {
                let scan_pipeline = pipeline.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let result = analyze(&scan_pipeline, &frame);
                    (result, frame.data)
                })
                .await;

                let result = match joined {
                    Ok((result, data)) => {
                        recycle(&worker_pool, data);
                        Some(result)
                    }
                    Err(err) => {
                        log::error!("brightness scan task failed: {err}");
                        None
                    }
                };

                // Free the slot before publishing so a reader reacting to this
                // result can submit the next frame immediately.
                worker_busy.store(false, Ordering::Release);

                if let Some(result) = result {
                    if worker_results.send(result).is_err() {
                        break;
                    }
                }
            }
            log::info!("frame worker stopped");
        });

        (
            Self {
                task_sender,
                result_sender,
                busy,
                frame_counter: AtomicU64::new(0),
                dropped_frames: AtomicU64::new(0),
                frame_buffer_pool,
                worker,
            },
            result_receiver,
        )
    }

    /// Copies the frame into a pooled buffer and starts scanning it, unless a scan
    /// is already running. Layout errors and a stopped worker (including one whose
    /// result receiver was dropped) are reported before the busy check.
    pub fn submit(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
        bytes_per_row: usize,
        layout: ChannelLayout,
    ) -> Result<Submission> {
        PixelBuffer::new(data, width, height, bytes_per_row, layout)?;

        if self.result_sender.is_closed() || self.task_sender.is_closed() {
            return Err(VisionError::WorkerUnavailable);
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            let dropped = self.dropped_frames.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!("scan in flight, dropping frame ({dropped} dropped so far)");
            return Ok(Submission::Dropped);
        }

        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let mut buffer = self
            .frame_buffer_pool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_default();
        buffer.clear();
        buffer.extend_from_slice(data);

        let frame = Frame {
            data: buffer,
            width,
            height,
            bytes_per_row,
            layout,
            frame_id,
            captured_at: Instant::now(),
        };

        if self.task_sender.send(frame).is_err() {
            self.busy.store(false, Ordering::Release);
            return Err(VisionError::WorkerUnavailable);
        }
        Ok(Submission::Accepted(frame_id))
    }

    /// Convenience for frames decoded with the `image` crate.
    pub fn submit_image(&self, image: &RgbaImage) -> Result<Submission> {
        let view = PixelBuffer::from_rgba_image(image);
        self.submit(view.data(), view.width(), view.height(), view.bytes_per_row(), view.layout())
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames.load(Ordering::Relaxed)
    }

    /// Stops accepting frames and waits for the in-flight scan to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        drop(self.result_sender);
        if let Err(err) = self.worker.await {
            log::error!("frame worker ended abnormally: {err}");
        }
    }
}

fn recycle(pool: &Mutex<VecDeque<Vec<u8>>>, buffer: Vec<u8>) {
    let mut pool = pool.lock().unwrap_or_else(PoisonError::into_inner);
    if pool.len() < FRAME_POOL_SIZE {
        pool.push_back(buffer);
    }
}

/// Scans independent frames in parallel, one blocking task per frame and at most
/// one task per core at a time. Results keep the input order.
pub async fn scan_frames(pipeline: &VisionPipeline, frames: Vec<Frame>) -> Vec<FrameResult> {
    let workers = num_cpus::get().max(1);
    stream::iter(frames)
        .map(|frame| {
            let pipeline = pipeline.clone();
            tokio::task::spawn_blocking(move || analyze(&pipeline, &frame))
        })
        .buffered(workers)
        .filter_map(|joined| async move {
            joined
                .map_err(|err| log::error!("brightness scan task failed: {err}"))
                .ok()
        })
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;
    use image::Rgba;

    fn spot_image(width: u32, height: u32, x0: u32, y0: u32) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        for y in y0..y0 + 10 {
            for x in x0..x0 + 10 {
                image.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        image
    }

    fn spot_center(result: &FrameResult) -> (u32, u32) {
        match result.report {
            Report::BrightSpot(spot) => spot.block_center,
            Report::NoBrightSpot => panic!("expected a bright spot"),
        }
    }

    #[tokio::test]
    async fn busy_worker_drops_new_frames() {
        let pipeline = VisionPipeline::new(PipelineConfig::default()).unwrap();
        let (worker, mut results) = FrameWorker::spawn(pipeline);

        let first = spot_image(200, 200, 40, 60);
        let second = spot_image(200, 200, 100, 100);

        assert_eq!(worker.submit_image(&first).unwrap(), Submission::Accepted(0));
        assert_eq!(worker.submit_image(&second).unwrap(), Submission::Dropped);
        assert_eq!(worker.dropped_frames(), 1);

        let result = results.recv().await.unwrap();
        assert_eq!(result.frame_id, 0);
        assert_eq!(spot_center(&result), (45, 65));

        assert_eq!(worker.submit_image(&second).unwrap(), Submission::Accepted(1));
        let result = results.recv().await.unwrap();
        assert_eq!(result.frame_id, 1);
        assert_eq!(spot_center(&result), (105, 105));
        assert!(result.latency() <= result.captured_at.elapsed());

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_layout_is_rejected_before_scheduling() {
        let pipeline = VisionPipeline::new(PipelineConfig::default()).unwrap();
        let (worker, _results) = FrameWorker::spawn(pipeline);
        let data = vec![0u8; 10];

        let err = worker.submit(&data, 10, 10, 40, ChannelLayout::RGBA8).unwrap_err();
        assert!(matches!(err, VisionError::BufferTooShort { .. }));
        assert!(!worker.is_busy());

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn dropped_result_receiver_stops_accepting_frames() {
        let pipeline = VisionPipeline::new(PipelineConfig::default()).unwrap();
        let (worker, results) = FrameWorker::spawn(pipeline);
        drop(results);

        let err = worker.submit_image(&spot_image(50, 50, 0, 0)).unwrap_err();
        assert!(matches!(err, VisionError::WorkerUnavailable));
        assert!(!worker.is_busy());
        assert_eq!(worker.dropped_frames(), 0);

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn stale_results_can_be_discarded() {
        let pipeline = VisionPipeline::new(PipelineConfig::default()).unwrap();
        let (worker, mut results) = FrameWorker::spawn(pipeline);
        worker.submit_image(&spot_image(50, 50, 0, 0)).unwrap();

        let result = results.recv().await.unwrap();
        assert!(!result.is_stale(Duration::from_secs(60)));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(result.is_stale(Duration::from_millis(1)));

        worker.shutdown().await;
    }

    #[tokio::test]
    async fn batch_scan_keeps_input_order() {
        let pipeline = VisionPipeline::new(PipelineConfig::default()).unwrap();
        let origins = [(0, 0), (30, 10), (60, 70), (90, 40), (10, 90)];
        let frames = origins
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Frame::from_rgba_image(spot_image(100, 100, x, y), id as u64))
            .collect();

        let results = scan_frames(&pipeline, frames).await;
        assert_eq!(results.len(), origins.len());
        for (id, (result, &(x, y))) in results.iter().zip(origins.iter()).enumerate() {
            assert_eq!(result.frame_id, id as u64);
            assert_eq!(spot_center(result), (x + 5, y + 5));
        }
    }

    #[test]
    fn owned_frame_validates_geometry() {
        let err = Frame::new(vec![0u8; 12], 2, 2, 8, ChannelLayout::RGBA8, 0).unwrap_err();
        assert!(matches!(err, VisionError::BufferTooShort { .. }));
        let frame = Frame::new(vec![0u8; 16], 2, 2, 8, ChannelLayout::RGBA8, 7).unwrap();
        assert_eq!(frame.view().unwrap().width(), 2);
    }
}
