use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use luma_image::yuv::{i420_to_nv12, nv12_to_i420, yuv_to_rgba};
use luma_image::{rotate, ColorFormat, PixelBuffer};

use crate::error::CameraError;
use crate::source::RawFrame;

/// How long [`FrameSink::wait_idle`] waits for an in-flight delivery before
/// giving up.
pub const STOP_GRACE: Duration = Duration::from_millis(200);

/// Chroma arrangement of the raw frames a source delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawLayout {
    /// Separate U and V planes (I420).
    Planar,
    /// One interleaved U/V plane (NV12).
    SemiPlanar,
}

#[derive(Default)]
struct FrameBuffers {
    /// Sensor-space frame, interleaved chroma.
    semiplanar: PixelBuffer,
    /// Sensor-space frame, split chroma.
    planar: PixelBuffer,
    /// Upright frame after orientation, interleaved chroma.
    oriented: PixelBuffer,
    /// Upright RGBA conversion.
    rgba: PixelBuffer,
    layout: Option<RawLayout>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Receiving end of the frame pipeline.
///
/// A capture source pushes raw frames in with [`FrameSink::deliver`] from its
/// own thread; consumers poll [`FrameSink::take_rgba`]. The handoff is lossy,
/// a single slot holding only the newest frame, and a delivery overwrites the
/// slot whether or not the previous frame was ever taken. One mutex guards
/// all buffers, so a reader never observes a half-written frame.
pub struct FrameSink {
    width: usize,
    height: usize,
    orientation: i32,
    buffers: Mutex<FrameBuffers>,
    frame_ready: AtomicBool,
    stopping: AtomicBool,
    in_flight: Mutex<usize>,
    idle: Condvar,
}

impl FrameSink {
    /// Builds a sink for frames of exactly `width` by `height` sensor-space
    /// pixels. `orientation` is the clockwise turn that makes frames
    /// upright, normalized into `[0, 360)`.
    pub fn new(width: usize, height: usize, orientation: i32) -> Self {
        Self {
            width,
            height,
            orientation: orientation.rem_euclid(360),
            buffers: Mutex::new(FrameBuffers::default()),
            frame_ready: AtomicBool::new(false),
            stopping: AtomicBool::new(false),
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn orientation(&self) -> i32 {
        self.orientation
    }

    /// Frame extents after orientation, as consumers see them.
    pub fn oriented_size(&self) -> (usize, usize) {
        if self.orientation == 90 || self.orientation == 270 {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// Chroma layout of the last delivered frame, `Unknown` before the
    /// first one arrives.
    pub fn color_format(&self) -> ColorFormat {
        match lock(&self.buffers).layout {
            Some(RawLayout::SemiPlanar) => ColorFormat::Yuv420SemiPlanar,
            Some(RawLayout::Planar) => ColorFormat::Yuv420Planar,
            None => ColorFormat::Unknown,
        }
    }

    /// Accepts one raw frame from the capture thread.
    ///
    /// Unusable frames are logged and dropped. Delivery may wait briefly
    /// on a reader still holding a [`FrameRef`], but never queues. Once
    /// [`FrameSink::begin_stop`] has run, new deliveries return
    /// immediately without touching the buffers.
    pub fn deliver(&self, frame: &RawFrame<'_>) {
        if self.stopping.load(Ordering::Acquire) {
            return;
        }
        {
            let mut count = lock(&self.in_flight);
            // begin_stop holds the same lock, so after it sets the flag no
            // new delivery can slip past this check.
            if self.stopping.load(Ordering::Acquire) {
                return;
            }
            *count += 1;
        }
        if let Err(e) = self.process(frame) {
            log::warn!("dropping frame: {e}");
        }
        let mut count = lock(&self.in_flight);
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn process(&self, frame: &RawFrame<'_>) -> Result<(), CameraError> {
        let (w, h) = (self.width, self.height);
        if w == 0 || h == 0 || w % 2 != 0 || h % 2 != 0 {
            return Err(CameraError::Frame(format!(
                "capture size {w}x{h} must be even and positive"
            )));
        }
        if frame.width != w || frame.height != h {
            return Err(CameraError::Frame(format!(
                "expected {w}x{h}, got {}x{}",
                frame.width, frame.height
            )));
        }
        if frame.y.pixel_stride != 1 {
            return Err(CameraError::Frame(format!(
                "luma pixel stride {} is unsupported",
                frame.y.pixel_stride
            )));
        }
        let layout = match (frame.u.pixel_stride, frame.v.pixel_stride) {
            (1, 1) => RawLayout::Planar,
            (2, 2) => RawLayout::SemiPlanar,
            (u, v) => {
                return Err(CameraError::Frame(format!(
                    "chroma pixel strides {u}/{v} are unsupported"
                )));
            }
        };
        let (cw, ch) = (w / 2, h / 2);
        if frame.y.data.len() < (h - 1) * frame.y.row_stride + w {
            return Err(CameraError::Frame("luma plane too small".to_string()));
        }
        for (name, plane) in [("U", &frame.u), ("V", &frame.v)] {
            let need = (ch - 1) * plane.row_stride + (cw - 1) * plane.pixel_stride + 1;
            if plane.data.len() < need {
                return Err(CameraError::Frame(format!("{name} plane too small")));
            }
        }

        let (ow, oh) = self.oriented_size();
        let mut buffers = lock(&self.buffers);
        buffers
            .semiplanar
            .ensure(ColorFormat::Yuv420SemiPlanar, w, h)?;
        buffers.planar.ensure(ColorFormat::Yuv420Planar, w, h)?;
        buffers
            .oriented
            .ensure(ColorFormat::Yuv420SemiPlanar, ow, oh)?;
        buffers.rgba.ensure(ColorFormat::Rgba, ow, oh)?;

        // Pack the raw planes into the buffer matching their layout, then
        // reshuffle the chroma to fill the other one. Both canonical
        // buffers are tightly packed at stride == w.
        let bufs = &mut *buffers;
        match layout {
            RawLayout::SemiPlanar => {
                pack_frame(frame, &mut bufs.semiplanar, layout);
                nv12_to_i420(bufs.semiplanar.data(), bufs.planar.data_mut(), w, h);
            }
            RawLayout::Planar => {
                pack_frame(frame, &mut bufs.planar, layout);
                i420_to_nv12(bufs.planar.data(), bufs.semiplanar.data_mut(), w, h);
            }
        }

        let FrameBuffers {
            semiplanar,
            oriented,
            rgba,
            layout: stored,
            ..
        } = &mut *buffers;
        rotate(semiplanar, oriented, self.orientation)?;
        convert_to_rgba(oriented, rgba);
        *stored = Some(layout);
        drop(buffers);

        self.frame_ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Takes the newest RGBA frame if one arrived since the last take. The
    /// returned guard holds the pipeline lock, so keep it short-lived.
    pub fn take_rgba(&self) -> Option<FrameRef<'_>> {
        if !self.frame_ready.swap(false, Ordering::AcqRel) {
            return None;
        }
        Some(FrameRef {
            guard: lock(&self.buffers),
            slot: Slot::Rgba,
        })
    }

    /// Borrows the latest frame in the requested format. Both chroma
    /// layouts and the RGBA conversion are refreshed on every delivery, so
    /// no conversion happens here.
    ///
    /// # Errors
    ///
    /// `CameraError::Frame` before the first frame arrives or for a format
    /// the pipeline does not produce.
    pub fn frame_data(&self, format: ColorFormat) -> Result<FrameRef<'_>, CameraError> {
        let guard = lock(&self.buffers);
        if guard.layout.is_none() {
            return Err(CameraError::Frame("no frame received yet".to_string()));
        }
        let slot = match format {
            ColorFormat::Yuv420SemiPlanar => Slot::SemiPlanar,
            ColorFormat::Yuv420Planar => Slot::Planar,
            ColorFormat::Rgba => Slot::Rgba,
            ColorFormat::Unknown => {
                return Err(CameraError::Frame(
                    "no frame data for the Unknown format".to_string(),
                ));
            }
        };
        Ok(FrameRef { guard, slot })
    }

    /// Reallocates the RGBA output at the given row stride, in pixels.
    ///
    /// # Errors
    ///
    /// `CameraError::Frame` before the first frame arrives; `Image` errors
    /// for an invalid stride.
    pub fn set_stride(&self, stride: usize) -> Result<(), CameraError> {
        let mut buffers = lock(&self.buffers);
        if !buffers.rgba.is_allocated() {
            return Err(CameraError::Frame("no frame received yet".to_string()));
        }
        buffers.rgba.restride(stride)?;
        // The restrided buffer starts out blank.
        self.frame_ready.store(false, Ordering::Release);
        Ok(())
    }

    /// Bars new deliveries. A delivery already past its stopping check may
    /// still be running; [`FrameSink::wait_idle`] waits it out.
    pub fn begin_stop(&self) {
        let _count = lock(&self.in_flight);
        self.stopping.store(true, Ordering::Release);
    }

    /// Waits until no delivery is in flight, up to `grace`. Returns whether
    /// the pipeline went idle in time.
    pub fn wait_idle(&self, grace: Duration) -> bool {
        let deadline = Instant::now() + grace;
        let mut count = lock(&self.in_flight);
        while *count > 0 {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, timeout) = self
                .idle
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            count = guard;
            if timeout.timed_out() && *count > 0 {
                return false;
            }
        }
        true
    }

    /// Re-arms the sink after a stop, allowing deliveries again.
    pub fn clear_stopping(&self) {
        self.stopping.store(false, Ordering::Release);
    }
}

fn pack_frame(frame: &RawFrame<'_>, dst: &mut PixelBuffer, layout: RawLayout) {
    let (w, h) = (frame.width, frame.height);
    let (cw, ch) = (w / 2, h / 2);
    let stride = dst.stride();
    let luma = h * stride;
    let out = dst.data_mut();
    for i in 0..h {
        out[i * stride..i * stride + w]
            .copy_from_slice(&frame.y.data[i * frame.y.row_stride..][..w]);
    }
    match layout {
        RawLayout::SemiPlanar => {
            let chroma = &mut out[luma..];
            for ci in 0..ch {
                let ur = &frame.u.data[ci * frame.u.row_stride..];
                let vr = &frame.v.data[ci * frame.v.row_stride..];
                for cj in 0..cw {
                    chroma[ci * stride + 2 * cj] = ur[cj * frame.u.pixel_stride];
                    chroma[ci * stride + 2 * cj + 1] = vr[cj * frame.v.pixel_stride];
                }
            }
        }
        RawLayout::Planar => {
            let (u_out, v_out) = out[luma..].split_at_mut(ch * cw);
            for ci in 0..ch {
                u_out[ci * cw..(ci + 1) * cw]
                    .copy_from_slice(&frame.u.data[ci * frame.u.row_stride..][..cw]);
                v_out[ci * cw..(ci + 1) * cw]
                    .copy_from_slice(&frame.v.data[ci * frame.v.row_stride..][..cw]);
            }
        }
    }
}

fn convert_to_rgba(src: &PixelBuffer, dst: &mut PixelBuffer) {
    let (w, h) = (src.width(), src.height());
    let ss = src.stride();
    let pitch = dst.stride();
    let (y, uv) = src.data().split_at(h * ss);
    let out = dst.pixels_mut();
    if pitch == w {
        yuv_to_rgba(y, uv, &uv[1..], out, w, h, ss, ss, 1, 2);
    } else {
        for i in 0..h {
            let yr = &y[i * ss..];
            let uvr = &uv[(i / 2) * ss..];
            let row = &mut out[i * pitch..i * pitch + w];
            yuv_to_rgba(yr, uvr, &uvr[1..], row, w, 1, ss, ss, 1, 2);
        }
    }
}

enum Slot {
    SemiPlanar,
    Planar,
    Rgba,
}

/// A borrowed frame. Holds the pipeline mutex for its lifetime; the capture
/// thread cannot overwrite the frame while a `FrameRef` is alive.
pub struct FrameRef<'a> {
    guard: MutexGuard<'a, FrameBuffers>,
    slot: Slot,
}

impl FrameRef<'_> {
    fn buffer(&self) -> &PixelBuffer {
        match self.slot {
            Slot::SemiPlanar => &self.guard.semiplanar,
            Slot::Planar => &self.guard.planar,
            Slot::Rgba => &self.guard.rgba,
        }
    }

    pub fn data(&self) -> &[u8] {
        self.buffer().data()
    }

    /// RGBA pixels as packed words; only meaningful for the RGBA slot.
    pub fn pixels(&self) -> &[u32] {
        self.buffer().pixels()
    }

    pub fn width(&self) -> usize {
        self.buffer().width()
    }

    pub fn height(&self) -> usize {
        self.buffer().height()
    }

    /// Samples per row: pixels for RGBA, bytes for YUV.
    pub fn stride(&self) -> usize {
        self.buffer().stride()
    }

    pub fn format(&self) -> ColorFormat {
        self.buffer().format()
    }
}
