//! V4L2 capture source, available behind the `v4l2` feature.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::pipeline::FrameSink;
use crate::source::{CaptureSource, Facing, RawFrame, RawPlane, StreamInfo};

const BUFFER_COUNT: u32 = 4;

/// Captures NV12 frames from a V4L2 device on a dedicated thread.
///
/// The device handle moves into the capture thread on `start`, so a stopped
/// source must be reopened before streaming again.
pub struct V4l2Source {
    device: Option<Device>,
    width: usize,
    height: usize,
    stride: usize,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl V4l2Source {
    pub fn new() -> Self {
        Self {
            device: None,
            width: 0,
            height: 0,
            stride: 0,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl Default for V4l2Source {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for V4l2Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Source")
            .field("device", &self.device.is_some())
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("streaming", &self.worker.is_some())
            .finish()
    }
}

impl CaptureSource for V4l2Source {
    fn open(&mut self, config: &CameraConfig) -> Result<StreamInfo, CameraError> {
        let device = Device::new(config.index())?;
        let format = Format::new(
            config.width() as u32,
            config.height() as u32,
            FourCC::new(b"NV12"),
        );
        let format = Capture::set_format(&device, &format)?;
        if format.fourcc != FourCC::new(b"NV12") {
            return Err(CameraError::Device(
                "NV12 format not supported by device".to_string(),
            ));
        }
        self.width = format.width as usize;
        self.height = format.height as usize;
        self.stride = if format.stride == 0 {
            self.width
        } else {
            format.stride as usize
        };
        self.device = Some(device);
        log::info!(
            "v4l2 device {} negotiated {}x{} stride {}",
            config.index(),
            self.width,
            self.height,
            self.stride
        );
        Ok(StreamInfo {
            width: self.width,
            height: self.height,
            facing: Facing::Back,
            orientation: 0,
        })
    }

    fn start(&mut self, sink: Arc<FrameSink>) -> Result<(), CameraError> {
        if self.worker.is_some() {
            return Err(CameraError::Device("already streaming".to_string()));
        }
        let device = self
            .device
            .take()
            .ok_or_else(|| CameraError::Device("source is not open".to_string()))?;
        let (width, height, stride) = (self.width, self.height, self.stride);
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);
        self.worker = Some(thread::spawn(move || {
            if let Err(e) = capture_loop(&device, &sink, width, height, stride, &running) {
                log::error!("v4l2 capture thread exited: {e}");
            }
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

    fn close(&mut self) {
        self.device = None;
    }
}

fn capture_loop(
    device: &Device,
    sink: &FrameSink,
    width: usize,
    height: usize,
    stride: usize,
    running: &AtomicBool,
) -> Result<(), CameraError> {
    let mut stream = MmapStream::with_buffers(device, Type::VideoCapture, BUFFER_COUNT)?;
    let luma = stride * height;
    let total = luma + stride * height / 2;
    while running.load(Ordering::Acquire) {
        let (bytes, _meta) = CaptureStream::next(&mut stream)?;
        if bytes.len() < total {
            log::warn!("short v4l2 buffer: {} of {total} bytes", bytes.len());
            continue;
        }
        let chroma = &bytes[luma..total];
        let frame = RawFrame {
            width,
            height,
            y: RawPlane {
                data: &bytes[..luma],
                row_stride: stride,
                pixel_stride: 1,
            },
            u: RawPlane {
                data: &chroma[..chroma.len() - 1],
                row_stride: stride,
                pixel_stride: 2,
            },
            v: RawPlane {
                data: &chroma[1..],
                row_stride: stride,
                pixel_stride: 2,
            },
        };
        sink.deliver(&frame);
    }
    Ok(())
}
