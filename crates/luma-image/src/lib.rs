//! Pixel buffer management and YUV color-space conversion.
//!
//! This crate owns the in-memory image model used by the capture pipeline:
//! aligned `PixelBuffer` allocation with stride/overflow validation, bit-exact
//! YUV 4:2:0 to RGBA conversion, NV12/I420 chroma reshuffling, and 90-degree
//! buffer rotation.

pub mod buffer;
pub mod error;
pub mod rotate;
pub mod yuv;

pub use buffer::{ColorFormat, PixelBuffer, ALIGNMENT, MAX_EXTENT};
pub use error::ImageError;
pub use rotate::rotate;
