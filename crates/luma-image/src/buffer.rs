use std::alloc::{self, Layout};
use std::ptr::NonNull;
use std::slice;

use crate::error::ImageError;

/// Alignment of every backing allocation, in bytes.
pub const ALIGNMENT: usize = 32;

/// Largest admissible height or stride. Keeping both extents below the
/// square root of `usize::MAX` means `stride * height` can never overflow.
pub const MAX_EXTENT: usize = 1 << (usize::BITS / 2);

/// Pixel layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorFormat {
    /// Cleared/unallocated state.
    #[default]
    Unknown,
    /// NV12: luma plane followed by one interleaved U/V plane.
    Yuv420SemiPlanar,
    /// I420: luma plane followed by separate U and V planes.
    Yuv420Planar,
    /// 32-bit RGBA, 8 bits per channel.
    Rgba,
}

/// Exclusively owned, aligned heap allocation.
struct AlignedBuf {
    ptr: NonNull<u8>,
    len: usize,
}

impl AlignedBuf {
    fn new(len: usize) -> Result<Self, ImageError> {
        let layout = Layout::from_size_align(len, ALIGNMENT)
            .map_err(|e| ImageError::InvalidArgument(format!("bad allocation layout: {e}")))?;
        // SAFETY: len > 0 is guaranteed by the size validation in the caller.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => Ok(Self { ptr, len }),
            None => {
                log::debug!("aligned allocation of {len} bytes failed");
                Err(ImageError::OutOfMemory)
            }
        }
    }

    fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/len describe a live allocation owned by self.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: ptr/len describe a live allocation owned exclusively by self.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        // SAFETY: allocated with the identical layout in new().
        unsafe {
            alloc::dealloc(
                self.ptr.as_ptr(),
                Layout::from_size_align_unchecked(self.len, ALIGNMENT),
            );
        }
    }
}

// SAFETY: AlignedBuf is a uniquely owned heap region with no interior
// mutability; moving or sharing it across threads is sound.
unsafe impl Send for AlignedBuf {}
unsafe impl Sync for AlignedBuf {}

fn byte_size(format: ColorFormat, stride: usize, height: usize) -> Option<usize> {
    let plane = stride.checked_mul(height)?;
    match format {
        ColorFormat::Yuv420SemiPlanar | ColorFormat::Yuv420Planar => {
            plane.checked_mul(3).map(|n| n / 2)
        }
        ColorFormat::Rgba => plane.checked_mul(4),
        ColorFormat::Unknown => None,
    }
}

/// A rectangular pixel buffer.
///
/// Stride is counted in samples per row (pixels for RGBA, bytes for YUV) and
/// may exceed the logical width for alignment. A `PixelBuffer` is either
/// fully allocated with consistent metadata, or fully cleared
/// (`ColorFormat::Unknown`, zero extents, no data) — no partial state is ever
/// observable.
#[derive(Default)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    stride: usize,
    format: ColorFormat,
    data: Option<AlignedBuf>,
}

impl PixelBuffer {
    /// A cleared buffer holding no allocation.
    pub const fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            stride: 0,
            format: ColorFormat::Unknown,
            data: None,
        }
    }

    /// Allocates a buffer with the default stride, the next multiple of 32
    /// at or above `width`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for zero extents, extents at or above
    /// [`MAX_EXTENT`], or `ColorFormat::Unknown`; `OutOfMemory` if the
    /// backing allocation fails.
    pub fn new(format: ColorFormat, width: usize, height: usize) -> Result<Self, ImageError> {
        Self::with_stride(format, width, height, 0)
    }

    /// Allocates a buffer with an explicit stride; `stride == 0` selects the
    /// default. The stride must be at least `width`.
    ///
    /// # Errors
    ///
    /// Same as [`PixelBuffer::new`], plus `InvalidArgument` when
    /// `stride < width`.
    pub fn with_stride(
        format: ColorFormat,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "extents must be positive, got {width}x{height}"
            )));
        }
        if height >= MAX_EXTENT || stride >= MAX_EXTENT {
            return Err(ImageError::InvalidArgument(format!(
                "height {height} or stride {stride} exceeds the safe bound {MAX_EXTENT}"
            )));
        }
        let stride = if stride == 0 {
            width
                .checked_next_multiple_of(32)
                .ok_or_else(|| ImageError::InvalidArgument(format!("width {width} too large")))?
        } else {
            stride
        };
        if stride >= MAX_EXTENT {
            return Err(ImageError::InvalidArgument(format!(
                "derived stride {stride} exceeds the safe bound {MAX_EXTENT}"
            )));
        }
        if stride < width {
            return Err(ImageError::InvalidArgument(format!(
                "stride {stride} is less than width {width}"
            )));
        }
        if format == ColorFormat::Unknown {
            return Err(ImageError::InvalidArgument(
                "cannot allocate an Unknown-format buffer".to_string(),
            ));
        }
        let size = byte_size(format, stride, height).ok_or_else(|| {
            ImageError::InvalidArgument(format!("buffer size overflows for stride {stride}"))
        })?;
        let data = AlignedBuf::new(size)?;
        Ok(Self {
            width,
            height,
            stride,
            format,
            data: Some(data),
        })
    }

    /// Releases the backing memory and zeroes all metadata. Idempotent.
    pub fn clear(&mut self) {
        self.width = 0;
        self.height = 0;
        self.stride = 0;
        self.format = ColorFormat::Unknown;
        self.data = None;
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn is_allocated(&self) -> bool {
        self.data.is_some()
    }

    /// Backing bytes; empty when the buffer is cleared.
    pub fn data(&self) -> &[u8] {
        self.data.as_ref().map(AlignedBuf::as_slice).unwrap_or(&[])
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        match &mut self.data {
            Some(buf) => buf.as_mut_slice(),
            None => &mut [],
        }
    }

    /// RGBA pixels as packed 32-bit words.
    pub fn pixels(&self) -> &[u32] {
        debug_assert_eq!(self.format, ColorFormat::Rgba);
        bytemuck::cast_slice(self.data())
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        debug_assert_eq!(self.format, ColorFormat::Rgba);
        bytemuck::cast_slice_mut(self.data_mut())
    }

    /// Copies pixel data from `src`, which must have the same format.
    ///
    /// RGBA copies row by row, honoring both strides. Semiplanar YUV copies
    /// the luma plane and the interleaved chroma plane as two blocks.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if either buffer is unallocated, the formats
    /// differ, or the destination cannot hold the source;
    /// `NotImplemented` for planar YUV.
    pub fn copy_from(&mut self, src: &PixelBuffer) -> Result<(), ImageError> {
        if !self.is_allocated() || !src.is_allocated() {
            return Err(ImageError::InvalidArgument(
                "copy requires two allocated buffers".to_string(),
            ));
        }
        if self.format != src.format {
            return Err(ImageError::InvalidArgument(format!(
                "format mismatch: {:?} vs {:?}",
                src.format, self.format
            )));
        }
        match self.format {
            ColorFormat::Rgba => {
                if self.height < src.height || self.width > src.width {
                    return Err(ImageError::InvalidArgument(format!(
                        "destination {}x{} cannot take {}x{} rows",
                        self.width, self.height, src.width, src.height
                    )));
                }
                let row = self.width * 4;
                let (dst_pitch, src_pitch) = (self.stride * 4, src.stride * 4);
                let src_data = src.data();
                let dst_data = self.data_mut();
                for i in 0..src.height {
                    dst_data[i * dst_pitch..i * dst_pitch + row]
                        .copy_from_slice(&src_data[i * src_pitch..i * src_pitch + row]);
                }
                Ok(())
            }
            ColorFormat::Yuv420SemiPlanar => {
                let luma = src.height * src.stride;
                let chroma = (src.height / 2) * src.stride;
                let dst_luma = self.height * self.stride;
                if self.data().len() < dst_luma + chroma || dst_luma < luma {
                    return Err(ImageError::InvalidArgument(
                        "destination too small for semiplanar copy".to_string(),
                    ));
                }
                let src_data = src.data();
                let dst_data = self.data_mut();
                dst_data[..luma].copy_from_slice(&src_data[..luma]);
                dst_data[dst_luma..dst_luma + chroma]
                    .copy_from_slice(&src_data[luma..luma + chroma]);
                Ok(())
            }
            ColorFormat::Yuv420Planar => Err(ImageError::NotImplemented("planar YUV copy")),
            ColorFormat::Unknown => Err(ImageError::InvalidArgument(
                "cannot copy an Unknown-format buffer".to_string(),
            )),
        }
    }

    /// Growth policy used by the frame pipeline: the buffer is replaced
    /// only when the incoming extents exceed the current ones; otherwise
    /// the existing allocation is reused in place. Newly grown buffers are
    /// allocated with `stride == width`. A format change that preserves
    /// the byte size (planar vs semiplanar) only retags. On failure the
    /// previous allocation is kept untouched.
    pub fn ensure(
        &mut self,
        format: ColorFormat,
        width: usize,
        height: usize,
    ) -> Result<(), ImageError> {
        let fits = self.width >= width && self.height >= height;
        if fits && self.data.is_some() {
            if self.format == format {
                return Ok(());
            }
            let same_size = byte_size(self.format, self.stride, self.height)
                == byte_size(format, self.stride, self.height);
            if same_size {
                self.format = format;
                return Ok(());
            }
        }
        *self = Self::with_stride(format, width, height, width)?;
        Ok(())
    }

    /// Reallocates the backing store at a caller-specified stride, keeping
    /// format and extents. The previous contents are discarded.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an unallocated buffer or `stride < width`;
    /// `OutOfMemory` if the new allocation fails (the old buffer is kept).
    pub fn restride(&mut self, stride: usize) -> Result<(), ImageError> {
        if !self.is_allocated() {
            return Err(ImageError::InvalidArgument(
                "cannot restride an unallocated buffer".to_string(),
            ));
        }
        if stride < self.width {
            return Err(ImageError::InvalidArgument(format!(
                "stride {stride} is less than width {}",
                self.width
            )));
        }
        if stride >= MAX_EXTENT {
            return Err(ImageError::InvalidArgument(format!(
                "stride {stride} exceeds the safe bound {MAX_EXTENT}"
            )));
        }
        let size = byte_size(self.format, stride, self.height).ok_or_else(|| {
            ImageError::InvalidArgument(format!("buffer size overflows for stride {stride}"))
        })?;
        let data = AlignedBuf::new(size)?;
        self.data = Some(data);
        self.stride = stride;
        Ok(())
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("format", &self.format)
            .field("allocated", &self.data.is_some())
            .finish()
    }
}
