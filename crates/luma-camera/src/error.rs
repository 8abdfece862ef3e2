use std::fmt;
use std::io;

use luma_image::ImageError;

#[derive(Debug)]
pub enum CameraError {
    /// Buffer allocation or conversion failure.
    Image(ImageError),
    /// The capture device could not be opened, configured, or stopped.
    Device(String),
    /// Frame-level failure: nothing captured yet, or an unusable frame.
    Frame(String),
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::Image(e) => write!(f, "image error: {e}"),
            CameraError::Device(msg) => write!(f, "device error: {msg}"),
            CameraError::Frame(msg) => write!(f, "frame error: {msg}"),
        }
    }
}

impl std::error::Error for CameraError {}

impl From<ImageError> for CameraError {
    fn from(e: ImageError) -> Self {
        CameraError::Image(e)
    }
}

impl From<io::Error> for CameraError {
    fn from(e: io::Error) -> Self {
        CameraError::Device(e.to_string())
    }
}
