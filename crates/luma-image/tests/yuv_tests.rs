use luma_image::yuv::{i420_to_nv12, nv12_to_i420, yuv_to_rgba};

// 4x4 frame: luma 1..=16, interleaved chroma 17..=24.
fn nv12_fixture() -> Vec<u8> {
    (1..=24).collect()
}

#[test]
fn nv12_to_i420_splits_chroma() {
    let src = nv12_fixture();
    let mut dst = vec![0u8; 24];
    nv12_to_i420(&src, &mut dst, 4, 4);
    assert_eq!(&dst[..16], &src[..16]);
    assert_eq!(&dst[16..20], &[17, 19, 21, 23]);
    assert_eq!(&dst[20..24], &[18, 20, 22, 24]);
}

#[test]
fn i420_to_nv12_interleaves_chroma() {
    let mut i420 = [0u8; 24];
    i420[..16].copy_from_slice(&nv12_fixture()[..16]);
    i420[16..20].copy_from_slice(&[17, 19, 21, 23]);
    i420[20..24].copy_from_slice(&[18, 20, 22, 24]);
    let mut dst = vec![0u8; 24];
    i420_to_nv12(&i420, &mut dst, 4, 4);
    assert_eq!(dst, nv12_fixture());
}

#[test]
fn reshuffles_are_inverse() {
    let src = nv12_fixture();
    let mut planar = vec![0u8; 24];
    let mut back = vec![0u8; 24];
    nv12_to_i420(&src, &mut planar, 4, 4);
    i420_to_nv12(&planar, &mut back, 4, 4);
    assert_eq!(back, src);
}

#[test]
fn black_frame_converts_to_opaque_black() {
    let y = [16u8; 16];
    let u = [128u8; 4];
    let v = [128u8; 4];
    let mut out = [0u32; 16];
    yuv_to_rgba(&y, &u, &v, &mut out, 4, 4, 4, 2, 1, 1);
    assert!(out.iter().all(|&px| px == 0xff00_0000));
}

#[test]
fn luma_below_black_point_clamps() {
    let y = [0u8; 16];
    let u = [128u8; 4];
    let v = [128u8; 4];
    let mut out = [0u32; 16];
    yuv_to_rgba(&y, &u, &v, &mut out, 4, 4, 4, 2, 1, 1);
    assert!(out.iter().all(|&px| px == 0xff00_0000));
}

#[test]
fn near_white_frame_is_gray_balanced() {
    let y = [235u8; 16];
    let u = [128u8; 4];
    let v = [128u8; 4];
    let mut out = [0u32; 16];
    yuv_to_rgba(&y, &u, &v, &mut out, 4, 4, 4, 2, 1, 1);
    for px in out {
        let r = px & 0xff;
        let g = (px >> 8) & 0xff;
        let b = (px >> 16) & 0xff;
        assert_eq!(px >> 24, 0xff);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(r >= 250);
    }
}

#[test]
fn semiplanar_chroma_reads_interleaved_pairs() {
    // Left half colored with (u=200, v=50), right half neutral.
    let y = [128u8; 16];
    let uv = [200u8, 50, 128, 128, 200, 50, 128, 128];
    let mut interleaved = [0u32; 16];
    yuv_to_rgba(&y, &uv, &uv[1..], &mut interleaved, 4, 4, 4, 4, 1, 2);

    let u = [200u8, 128, 200, 128];
    let v = [50u8, 128, 50, 128];
    let mut planar = [0u32; 16];
    yuv_to_rgba(&y, &u, &v, &mut planar, 4, 4, 4, 2, 1, 1);

    assert_eq!(interleaved, planar);
    // The two halves really differ.
    assert_ne!(interleaved[0], interleaved[2]);
}

#[test]
fn row_strides_skip_padding() {
    // 2x2 image with luma rows padded to 8 bytes.
    let mut y = [0u8; 16];
    y[0] = 100;
    y[1] = 110;
    y[8] = 120;
    y[9] = 130;
    let u = [128u8; 4];
    let v = [128u8; 4];
    let mut padded = [0u32; 4];
    yuv_to_rgba(&y, &u, &v, &mut padded, 2, 2, 8, 4, 1, 1);

    let tight = [100u8, 110, 120, 130];
    let mut expect = [0u32; 4];
    yuv_to_rgba(&tight, &u, &v, &mut expect, 2, 2, 2, 1, 1, 1);
    assert_eq!(padded, expect);
}
