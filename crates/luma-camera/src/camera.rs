use std::sync::Arc;

use luma_image::{ColorFormat, ImageError};

use crate::config::CameraConfig;
use crate::error::CameraError;
use crate::pipeline::{FrameRef, FrameSink, STOP_GRACE};
use crate::registry::CameraRegistry;
use crate::source::{CaptureSource, Facing, StreamInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Configured,
    Streaming,
    Stopped,
    Closed,
}

/// An opened capture device together with its frame pipeline.
///
/// Frames flow from the source's capture thread into the sink; the owner
/// polls [`Camera::rgba`] for upright RGBA frames. Dropping a `Camera`
/// stops streaming and releases the device.
pub struct Camera {
    source: Box<dyn CaptureSource>,
    sink: Arc<FrameSink>,
    info: StreamInfo,
    state: State,
    registry: Option<Arc<CameraRegistry>>,
}

impl Camera {
    /// Opens `source` with the given configuration and builds the pipeline
    /// around the negotiated stream.
    ///
    /// # Errors
    ///
    /// Whatever the source reports from its own open.
    pub fn open(
        mut source: Box<dyn CaptureSource>,
        config: &CameraConfig,
    ) -> Result<Self, CameraError> {
        let info = source.open(config)?;
        log::info!(
            "opened camera {}: {}x{}, orientation {}",
            config.index(),
            info.width,
            info.height,
            info.orientation
        );
        let sink = Arc::new(FrameSink::new(info.width, info.height, info.orientation));
        Ok(Self {
            source,
            sink,
            info,
            state: State::Configured,
            registry: None,
        })
    }

    /// Like [`Camera::open`], additionally enrolling the pipeline in
    /// `registry` so it is covered by [`CameraRegistry::stop_all`].
    ///
    /// # Errors
    ///
    /// Source open errors, or `CameraError::Device` when the registry is
    /// full (the source is closed again in that case).
    pub fn open_with_registry(
        source: Box<dyn CaptureSource>,
        config: &CameraConfig,
        registry: &Arc<CameraRegistry>,
    ) -> Result<Self, CameraError> {
        let mut camera = Self::open(source, config)?;
        if let Err(e) = registry.register(&camera.sink) {
            camera.source.close();
            camera.state = State::Closed;
            return Err(e);
        }
        camera.registry = Some(Arc::clone(registry));
        Ok(camera)
    }

    /// Starts frame delivery.
    ///
    /// # Errors
    ///
    /// `CameraError::Device` when already streaming or closed, or whatever
    /// the source reports.
    pub fn start(&mut self) -> Result<(), CameraError> {
        match self.state {
            State::Configured | State::Stopped => {}
            State::Streaming => {
                return Err(CameraError::Device("already streaming".to_string()));
            }
            State::Closed => return Err(CameraError::Device("camera is closed".to_string())),
        }
        self.sink.clear_stopping();
        self.source.start(Arc::clone(&self.sink))?;
        self.state = State::Streaming;
        Ok(())
    }

    /// Stops frame delivery and waits for any in-flight frame to finish.
    /// A no-op unless streaming.
    ///
    /// # Errors
    ///
    /// Whatever the source reports from its stop.
    pub fn stop(&mut self) -> Result<(), CameraError> {
        if self.state != State::Streaming {
            return Ok(());
        }
        self.sink.begin_stop();
        self.source.stop()?;
        if !self.sink.wait_idle(STOP_GRACE) {
            log::warn!("a frame delivery did not finish within {STOP_GRACE:?}");
        }
        self.state = State::Stopped;
        Ok(())
    }

    /// Stops streaming if needed and releases the device.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state == State::Closed {
            return;
        }
        if self.state == State::Streaming {
            self.sink.begin_stop();
            if let Err(e) = self.source.stop() {
                log::warn!("stopping capture during close failed: {e}");
            }
            if !self.sink.wait_idle(STOP_GRACE) {
                log::warn!("a frame delivery did not finish within {STOP_GRACE:?}");
            }
        }
        self.source.close();
        if let Some(registry) = self.registry.take() {
            registry.unregister(&self.sink);
        }
        self.state = State::Closed;
    }

    /// Frame width as consumers see it, after orientation.
    pub fn width(&self) -> usize {
        self.sink.oriented_size().0
    }

    /// Frame height as consumers see it, after orientation.
    pub fn height(&self) -> usize {
        self.sink.oriented_size().1
    }

    pub fn facing(&self) -> Facing {
        self.info.facing
    }

    /// Clockwise degrees the sensor image is turned to appear upright.
    pub fn orientation(&self) -> i32 {
        self.sink.orientation()
    }

    /// Chroma layout the device delivers, `Unknown` before the first frame.
    pub fn color_format(&self) -> ColorFormat {
        self.sink.color_format()
    }

    /// Takes the newest upright RGBA frame, or `None` if nothing new
    /// arrived since the last take.
    pub fn rgba(&self) -> Option<FrameRef<'_>> {
        self.sink.take_rgba()
    }

    /// Borrows the latest frame in a specific format.
    ///
    /// # Errors
    ///
    /// See [`FrameSink::frame_data`].
    pub fn data(&self, format: ColorFormat) -> Result<FrameRef<'_>, CameraError> {
        self.sink.frame_data(format)
    }

    /// Changes the RGBA output row stride, in pixels. The stride must be a
    /// multiple of 16 and at least the frame width.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unaligned or short stride;
    /// `CameraError::Frame` before the first frame arrives.
    pub fn set_stride(&self, stride: usize) -> Result<(), CameraError> {
        if stride % 16 != 0 {
            return Err(ImageError::InvalidArgument(format!(
                "stride {stride} is not a multiple of 16"
            ))
            .into());
        }
        self.sink.set_stride(stride)
    }

    /// The pipeline shared with the capture source.
    pub fn sink(&self) -> &Arc<FrameSink> {
        &self.sink
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        self.shutdown();
    }
}
