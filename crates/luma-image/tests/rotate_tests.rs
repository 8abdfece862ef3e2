use luma_image::{rotate, ColorFormat, ImageError, PixelBuffer};

// 4x2 semiplanar frame: luma 1..=8 row-major, chroma pairs (17,18) (19,20).
fn frame_4x2() -> PixelBuffer {
    let mut buf = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    buf.data_mut()[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
    buf.data_mut()[8..12].copy_from_slice(&[17, 18, 19, 20]);
    buf
}

#[test]
fn quarter_turn_clockwise() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    rotate(&src, &mut dst, 90).unwrap();
    assert_eq!(&dst.data()[..8], &[5, 1, 6, 2, 7, 3, 8, 4]);
    assert_eq!(&dst.data()[8..12], &[17, 18, 19, 20]);
}

#[test]
fn half_turn() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    rotate(&src, &mut dst, 180).unwrap();
    assert_eq!(&dst.data()[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
    assert_eq!(&dst.data()[8..12], &[19, 20, 17, 18]);
}

#[test]
fn quarter_turn_counterclockwise() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    rotate(&src, &mut dst, 270).unwrap();
    assert_eq!(&dst.data()[..8], &[4, 8, 3, 7, 2, 6, 1, 5]);
    assert_eq!(&dst.data()[8..12], &[19, 20, 17, 18]);
}

#[test]
fn zero_turn_copies() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    rotate(&src, &mut dst, 0).unwrap();
    assert_eq!(dst.data(), src.data());
}

#[test]
fn negative_angles_normalize() {
    let src = frame_4x2();
    let mut cw = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    let mut ccw = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    rotate(&src, &mut cw, 90).unwrap();
    rotate(&src, &mut ccw, -270).unwrap();
    assert_eq!(cw.data(), ccw.data());
}

#[test]
fn four_quarter_turns_are_identity() {
    let src = frame_4x2();
    let mut a = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    let mut b = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    let mut c = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 2, 4, 2).unwrap();
    let mut d = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    rotate(&src, &mut a, 90).unwrap();
    rotate(&a, &mut b, 90).unwrap();
    rotate(&b, &mut c, 90).unwrap();
    rotate(&c, &mut d, 90).unwrap();
    assert_eq!(d.data(), src.data());
}

#[test]
fn rejects_oblique_angles() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    assert!(matches!(
        rotate(&src, &mut dst, 45),
        Err(ImageError::InvalidArgument(_))
    ));
}

#[test]
fn rejects_wrong_destination_extents() {
    let src = frame_4x2();
    // A quarter turn needs swapped extents.
    let mut dst = PixelBuffer::with_stride(ColorFormat::Yuv420SemiPlanar, 4, 2, 4).unwrap();
    assert!(matches!(
        rotate(&src, &mut dst, 90),
        Err(ImageError::InvalidArgument(_))
    ));
}

#[test]
fn rejects_unallocated_destination() {
    let src = frame_4x2();
    let mut dst = PixelBuffer::empty();
    assert!(matches!(
        rotate(&src, &mut dst, 90),
        Err(ImageError::InvalidArgument(_))
    ));
}

#[test]
fn rgba_rotation_is_not_implemented() {
    let src = PixelBuffer::new(ColorFormat::Rgba, 4, 2).unwrap();
    let mut dst = PixelBuffer::new(ColorFormat::Rgba, 2, 4).unwrap();
    assert!(matches!(
        rotate(&src, &mut dst, 90),
        Err(ImageError::NotImplemented(_))
    ));
}
