//! YUV 4:2:0 conversions.
//!
//! All functions here are caller-contract operations: malformed strides or
//! undersized planes are programming errors caught by assertions, not
//! recoverable failures.

/// Converts one full-range BT.601 YUV sample to a packed RGBA word,
/// `0xff << 24 | b << 16 | g << 8 | r`.
#[inline]
fn yuv_to_rgb(y: i32, u: i32, v: i32) -> u32 {
    let y = (y - 16).max(0);
    let u = u - 128;
    let v = v - 128;
    let r = (1192 * y + 1634 * v).clamp(0, 262143);
    let g = (1192 * y - 833 * v - 400 * u).clamp(0, 262143);
    let b = (1192 * y + 2066 * u).clamp(0, 262143);
    let r = ((r >> 10) & 0xff) as u32;
    let g = ((g >> 10) & 0xff) as u32;
    let b = ((b >> 10) & 0xff) as u32;
    0xff00_0000 | (b << 16) | (g << 8) | r
}

/// Converts 4:2:0 YUV planes to packed RGBA, one output word per luma
/// sample.
///
/// Chroma is sampled at half resolution in both axes: each chroma sample
/// covers two luma columns, and each chroma row covers two luma rows. With
/// `uv_pixel_stride == 1` the U/V slices are separate planar arrays; with
/// `uv_pixel_stride == 2` they are the interleaved semiplanar plane, `u`
/// starting at the first U byte and `v` at the first V byte.
///
/// # Panics
///
/// Asserts `y_pixel_stride == 1`, `uv_pixel_stride ∈ {1, 2}`, and that the
/// planes and output cover `width * height` samples at the given strides.
#[allow(clippy::too_many_arguments)]
pub fn yuv_to_rgba(
    y: &[u8],
    u: &[u8],
    v: &[u8],
    out: &mut [u32],
    width: usize,
    height: usize,
    y_row_stride: usize,
    uv_row_stride: usize,
    y_pixel_stride: usize,
    uv_pixel_stride: usize,
) {
    assert_eq!(y_pixel_stride, 1, "luma pixel stride must be 1");
    assert!(
        uv_pixel_stride == 1 || uv_pixel_stride == 2,
        "chroma pixel stride must be 1 or 2"
    );
    assert!(out.len() >= width * height, "output too small");
    if height == 0 || width == 0 {
        return;
    }
    assert!(
        y.len() >= (height - 1) * y_row_stride + width,
        "luma plane too small"
    );
    let last_chroma = ((height - 1) / 2) * uv_row_stride + (width / 2 - 1) * uv_pixel_stride;
    assert!(u.len() > last_chroma, "U plane too small");
    assert!(v.len() > last_chroma, "V plane too small");

    for i in 0..height {
        let row = &mut out[i * width..(i + 1) * width];
        let yr = &y[i * y_row_stride..];
        let ur = &u[(i / 2) * uv_row_stride..];
        let vr = &v[(i / 2) * uv_row_stride..];
        for j in 0..width / 2 {
            let us = ur[j * uv_pixel_stride] as i32;
            let vs = vr[j * uv_pixel_stride] as i32;
            row[2 * j] = yuv_to_rgb(yr[2 * j] as i32, us, vs);
            row[2 * j + 1] = yuv_to_rgb(yr[2 * j + 1] as i32, us, vs);
        }
    }
}

/// De-interleaves the NV12 chroma plane into separate I420 U and V planes.
/// Luma is copied verbatim. Buffers are tightly packed
/// (`width * height * 3 / 2` bytes); dimensions must be even.
///
/// `i420_to_nv12` is the exact inverse.
pub fn nv12_to_i420(src: &[u8], dst: &mut [u8], width: usize, height: usize) {
    assert!(width % 2 == 0 && height % 2 == 0, "even dimensions required");
    let luma = width * height;
    assert!(src.len() >= luma * 3 / 2, "source too small");
    assert!(dst.len() >= luma * 3 / 2, "destination too small");

    dst[..luma].copy_from_slice(&src[..luma]);
    let (cw, ch) = (width / 2, height / 2);
    let src_uv = &src[luma..];
    let (u_dst, v_dst) = dst[luma..].split_at_mut(cw * ch);
    for i in 0..ch {
        for j in 0..cw {
            u_dst[i * cw + j] = src_uv[i * width + 2 * j];
            v_dst[i * cw + j] = src_uv[i * width + 2 * j + 1];
        }
    }
}

/// Interleaves separate I420 U and V planes into the NV12 chroma plane.
/// See [`nv12_to_i420`].
pub fn i420_to_nv12(src: &[u8], dst: &mut [u8], width: usize, height: usize) {
    assert!(width % 2 == 0 && height % 2 == 0, "even dimensions required");
    let luma = width * height;
    assert!(src.len() >= luma * 3 / 2, "source too small");
    assert!(dst.len() >= luma * 3 / 2, "destination too small");

    dst[..luma].copy_from_slice(&src[..luma]);
    let (cw, ch) = (width / 2, height / 2);
    let u_src = &src[luma..luma + cw * ch];
    let v_src = &src[luma + cw * ch..];
    let dst_uv = &mut dst[luma..];
    for i in 0..ch {
        for j in 0..cw {
            dst_uv[i * width + 2 * j] = u_src[i * cw + j];
            dst_uv[i * width + 2 * j + 1] = v_src[i * cw + j];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn black_and_white_points() {
        // Full-range bias: Y=16 is black, Y=235 is near-white.
        assert_eq!(yuv_to_rgb(16, 128, 128), 0xff00_0000);
        let white = yuv_to_rgb(235, 128, 128);
        let r = white & 0xff;
        let g = (white >> 8) & 0xff;
        let b = (white >> 16) & 0xff;
        assert_eq!(white >> 24, 0xff);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r >= 250);
    }

    #[test]
    fn clamps_saturated_chroma() {
        let px = yuv_to_rgb(235, 255, 255);
        assert_eq!(px & 0xff, 0xff); // red saturates high
        assert_eq!((px >> 8) & 0xff, 0); // green clamps at zero
    }
}
