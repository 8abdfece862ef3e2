use std::sync::Arc;

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::pipeline::FrameSink;

/// Which way the lens points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

/// Negotiated stream properties, reported by a source after `open`.
#[derive(Debug, Clone, Copy)]
pub struct StreamInfo {
    /// Sensor-space frame width.
    pub width: usize,
    /// Sensor-space frame height.
    pub height: usize,
    pub facing: Facing,
    /// Clockwise degrees the sensor image must be turned to appear upright.
    pub orientation: i32,
}

/// One plane of a raw captured frame.
#[derive(Debug, Clone, Copy)]
pub struct RawPlane<'a> {
    pub data: &'a [u8],
    /// Bytes from one row to the next.
    pub row_stride: usize,
    /// Bytes from one sample to the next within a row.
    pub pixel_stride: usize,
}

/// A borrowed YUV 4:2:0 frame as the device hands it over. For semiplanar
/// layouts `u` and `v` alias the interleaved chroma plane with
/// `pixel_stride == 2`, offset by one byte from each other.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    pub width: usize,
    pub height: usize,
    pub y: RawPlane<'a>,
    pub u: RawPlane<'a>,
    pub v: RawPlane<'a>,
}

/// A frame producer. Implementations own their device handle and delivery
/// thread; the pipeline only sees [`FrameSink::deliver`] calls.
pub trait CaptureSource: Send {
    /// Opens the device and negotiates a mode near the configured one.
    ///
    /// # Errors
    ///
    /// `CameraError::Device` when the device cannot be opened or no usable
    /// mode exists.
    fn open(&mut self, config: &CameraConfig) -> Result<StreamInfo, CameraError>;

    /// Starts delivering frames into `sink` until [`CaptureSource::stop`].
    ///
    /// # Errors
    ///
    /// `CameraError::Device` when streaming cannot begin.
    fn start(&mut self, sink: Arc<FrameSink>) -> Result<(), CameraError>;

    /// Stops frame delivery. After this returns no new `deliver` call may
    /// begin, though one already in flight may still be running.
    ///
    /// # Errors
    ///
    /// `CameraError::Device` when the device refuses to stop cleanly.
    fn stop(&mut self) -> Result<(), CameraError>;

    /// Releases the device handle. Default is a no-op.
    fn close(&mut self) {}
}

/// Picks the mode with the smallest Euclidean distance to the requested
/// resolution. Ties keep the earlier entry.
pub fn nearest_mode(
    modes: &[(usize, usize)],
    width: usize,
    height: usize,
) -> Option<(usize, usize)> {
    modes
        .iter()
        .copied()
        .min_by_key(|&(w, h)| {
            let dw = w.abs_diff(width);
            let dh = h.abs_diff(height);
            dw * dw + dh * dh
        })
}
