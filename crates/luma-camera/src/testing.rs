//! An in-process capture source for tests and examples.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::pipeline::{FrameSink, RawLayout};
use crate::source::{nearest_mode, CaptureSource, Facing, RawFrame, RawPlane, StreamInfo};

/// A deterministic frame generator that behaves like a real device:
/// it negotiates a mode, runs its own delivery thread, and honors
/// stop/start cycles.
pub struct SyntheticSource {
    modes: Vec<(usize, usize)>,
    layout: RawLayout,
    interval: Duration,
    frame_limit: Option<usize>,
    facing: Facing,
    orientation: i32,
    size: (usize, usize),
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            modes: vec![(320, 240), (640, 480), (1280, 720)],
            layout: RawLayout::SemiPlanar,
            interval: Duration::from_millis(5),
            frame_limit: None,
            facing: Facing::Front,
            orientation: 0,
            size: (0, 0),
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Capture modes offered during negotiation.
    pub fn with_modes(mut self, modes: Vec<(usize, usize)>) -> Self {
        self.modes = modes;
        self
    }

    /// Chroma layout of the generated frames.
    pub fn with_layout(mut self, layout: RawLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Delay between generated frames.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Stop generating after this many frames.
    pub fn with_frame_limit(mut self, limit: usize) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn with_facing(mut self, facing: Facing) -> Self {
        self.facing = facing;
        self
    }

    /// Sensor orientation to report, in clockwise degrees.
    pub fn with_orientation(mut self, orientation: i32) -> Self {
        self.orientation = orientation;
        self
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for SyntheticSource {
    fn open(&mut self, config: &CameraConfig) -> Result<StreamInfo, CameraError> {
        let (width, height) = nearest_mode(&self.modes, config.width(), config.height())
            .ok_or_else(|| CameraError::Device("no capture modes available".to_string()))?;
        self.size = (width, height);
        Ok(StreamInfo {
            width,
            height,
            facing: self.facing,
            orientation: self.orientation,
        })
    }

    fn start(&mut self, sink: Arc<FrameSink>) -> Result<(), CameraError> {
        if self.worker.is_some() {
            return Err(CameraError::Device("already streaming".to_string()));
        }
        let (w, h) = self.size;
        if w == 0 || h == 0 {
            return Err(CameraError::Device("source is not open".to_string()));
        }
        let layout = self.layout;
        let interval = self.interval;
        let frame_limit = self.frame_limit;
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);
        self.worker = Some(thread::spawn(move || {
            generate(&sink, w, h, layout, interval, frame_limit, &running);
        }));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        Ok(())
    }
}

fn generate(
    sink: &FrameSink,
    w: usize,
    h: usize,
    layout: RawLayout,
    interval: Duration,
    frame_limit: Option<usize>,
    running: &AtomicBool,
) {
    let luma = w * h;
    let (cw, ch) = (w / 2, h / 2);
    let mut raw = vec![0u8; luma * 3 / 2];
    let mut n = 0usize;
    while running.load(Ordering::Acquire) && frame_limit.is_none_or(|max| n < max) {
        // Diagonal luma gradient that shifts every frame, mid-gray chroma
        // with a mild ramp so conversions have something to chew on.
        for i in 0..h {
            for j in 0..w {
                raw[i * w + j] = ((i + j + n) % 220 + 16) as u8;
            }
        }
        for (k, b) in raw[luma..].iter_mut().enumerate() {
            *b = (96 + (k + n) % 64) as u8;
        }
        let (y, chroma) = raw.split_at(luma);
        let y = RawPlane {
            data: y,
            row_stride: w,
            pixel_stride: 1,
        };
        let frame = match layout {
            RawLayout::SemiPlanar => RawFrame {
                width: w,
                height: h,
                y,
                u: RawPlane {
                    data: &chroma[..chroma.len() - 1],
                    row_stride: w,
                    pixel_stride: 2,
                },
                v: RawPlane {
                    data: &chroma[1..],
                    row_stride: w,
                    pixel_stride: 2,
                },
            },
            RawLayout::Planar => RawFrame {
                width: w,
                height: h,
                y,
                u: RawPlane {
                    data: &chroma[..cw * ch],
                    row_stride: cw,
                    pixel_stride: 1,
                },
                v: RawPlane {
                    data: &chroma[cw * ch..],
                    row_stride: cw,
                    pixel_stride: 1,
                },
            },
        };
        sink.deliver(&frame);
        n += 1;
        thread::sleep(interval);
    }
}
