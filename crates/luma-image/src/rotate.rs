use crate::buffer::{ColorFormat, PixelBuffer};
use crate::error::ImageError;

/// Rotates `src` into `dst` by a clockwise multiple of 90 degrees.
///
/// `degrees` is normalized into `[0, 360)`, so `-90` means `270`. The
/// destination must already be allocated with the same format as the source
/// and with matching extents: equal for 0 and 180 degrees, swapped for 90
/// and 270. Only semiplanar YUV 4:2:0 buffers rotate; the chroma plane moves
/// in interleaved U/V pairs so subsampled color stays attached to its luma
/// quad.
///
/// # Errors
///
/// `InvalidArgument` for angles that are not a multiple of 90, unallocated
/// buffers, format mismatches, or wrong destination extents;
/// `NotImplemented` for formats other than semiplanar YUV.
pub fn rotate(src: &PixelBuffer, dst: &mut PixelBuffer, degrees: i32) -> Result<(), ImageError> {
    let degrees = degrees.rem_euclid(360);
    if degrees % 90 != 0 {
        return Err(ImageError::InvalidArgument(format!(
            "rotation {degrees} is not a multiple of 90"
        )));
    }
    if !src.is_allocated() || !dst.is_allocated() {
        return Err(ImageError::InvalidArgument(
            "rotation requires two allocated buffers".to_string(),
        ));
    }
    if src.format() != dst.format() {
        return Err(ImageError::InvalidArgument(format!(
            "format mismatch: {:?} vs {:?}",
            src.format(),
            dst.format()
        )));
    }
    let swapped = degrees == 90 || degrees == 270;
    let (want_w, want_h) = if swapped {
        (src.height(), src.width())
    } else {
        (src.width(), src.height())
    };
    if dst.width() != want_w || dst.height() != want_h {
        return Err(ImageError::InvalidArgument(format!(
            "destination must be {want_w}x{want_h} for a {degrees} degree turn, got {}x{}",
            dst.width(),
            dst.height()
        )));
    }
    match src.format() {
        ColorFormat::Yuv420SemiPlanar => rotate_yuv420sp(src, dst, degrees),
        _ => Err(ImageError::NotImplemented(
            "rotation for this color format",
        )),
    }
}

fn rotate_yuv420sp(src: &PixelBuffer, dst: &mut PixelBuffer, degrees: i32) -> Result<(), ImageError> {
    let (w, h) = (src.width(), src.height());
    let (ss, ds) = (src.stride(), dst.stride());
    let luma_src = h * ss;
    let luma_dst = dst.height() * ds;
    let (cw, ch) = (w / 2, h / 2);

    if degrees == 0 {
        return dst.copy_from(src);
    }

    let s = src.data();
    let d = dst.data_mut();
    match degrees {
        90 => {
            for i in 0..h {
                for j in 0..w {
                    d[j * ds + (h - 1 - i)] = s[i * ss + j];
                }
            }
            let (sc, dc) = (&s[luma_src..], &mut d[luma_dst..]);
            for ci in 0..ch {
                for cj in 0..cw {
                    let to = cj * ds + 2 * (ch - 1 - ci);
                    dc[to] = sc[ci * ss + 2 * cj];
                    dc[to + 1] = sc[ci * ss + 2 * cj + 1];
                }
            }
        }
        180 => {
            for i in 0..h {
                for j in 0..w {
                    d[(h - 1 - i) * ds + (w - 1 - j)] = s[i * ss + j];
                }
            }
            let (sc, dc) = (&s[luma_src..], &mut d[luma_dst..]);
            for ci in 0..ch {
                for cj in 0..cw {
                    let to = (ch - 1 - ci) * ds + 2 * (cw - 1 - cj);
                    dc[to] = sc[ci * ss + 2 * cj];
                    dc[to + 1] = sc[ci * ss + 2 * cj + 1];
                }
            }
        }
        270 => {
            for i in 0..h {
                for j in 0..w {
                    d[(w - 1 - j) * ds + i] = s[i * ss + j];
                }
            }
            let (sc, dc) = (&s[luma_src..], &mut d[luma_dst..]);
            for ci in 0..ch {
                for cj in 0..cw {
                    let to = (cw - 1 - cj) * ds + 2 * ci;
                    dc[to] = sc[ci * ss + 2 * cj];
                    dc[to + 1] = sc[ci * ss + 2 * cj + 1];
                }
            }
        }
        _ => unreachable!(),
    }
    Ok(())
}
