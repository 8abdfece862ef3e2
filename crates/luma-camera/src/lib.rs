//! Camera frame acquisition and normalization.
//!
//! A [`CaptureSource`] produces raw YUV 4:2:0 frames on its own thread and
//! pushes them into a [`FrameSink`], which validates, reshuffles, orients,
//! and converts each frame to RGBA under a single lock. A [`Camera`] ties a
//! source and sink together; a [`CameraRegistry`] lets an application halt
//! every pipeline at once.
//!
//! ```no_run
//! use luma_camera::{Camera, CameraConfig, SyntheticSource};
//!
//! # fn main() -> Result<(), luma_camera::CameraError> {
//! let config = CameraConfig::new().with_resolution(640, 480);
//! let mut camera = Camera::open(Box::new(SyntheticSource::new()), &config)?;
//! camera.start()?;
//! if let Some(frame) = camera.rgba() {
//!     println!("{}x{} pixels", frame.width(), frame.height());
//! }
//! camera.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod camera;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod testing;
#[cfg(feature = "v4l2")]
pub mod v4l2;

pub use camera::Camera;
pub use config::CameraConfig;
pub use error::CameraError;
pub use luma_image::{ColorFormat, ImageError, PixelBuffer};
pub use pipeline::{FrameRef, FrameSink, RawLayout, STOP_GRACE};
pub use registry::{CameraRegistry, MAX_CAMERAS};
pub use source::{nearest_mode, CaptureSource, Facing, RawFrame, RawPlane, StreamInfo};
pub use testing::SyntheticSource;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Source;
