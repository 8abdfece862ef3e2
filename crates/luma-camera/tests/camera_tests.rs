use std::thread;
use std::time::Duration;

use luma_camera::{
    Camera, CameraConfig, CameraError, ColorFormat, Facing, RawLayout, SyntheticSource,
};

fn poll_frame(camera: &Camera) -> bool {
    for _ in 0..200 {
        if let Some(frame) = camera.rgba() {
            assert_eq!(frame.format(), ColorFormat::Rgba);
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn negotiates_nearest_mode() {
    let source = SyntheticSource::new();
    let config = CameraConfig::new().with_resolution(600, 400);
    let camera = Camera::open(Box::new(source), &config).unwrap();
    assert_eq!(camera.width(), 640);
    assert_eq!(camera.height(), 480);
    assert_eq!(camera.facing(), Facing::Front);
    assert_eq!(camera.orientation(), 0);
}

#[test]
fn open_fails_without_modes() {
    let source = SyntheticSource::new().with_modes(Vec::new());
    let result = Camera::open(Box::new(source), &CameraConfig::new());
    assert!(matches!(result, Err(CameraError::Device(_))));
}

#[test]
fn streams_semiplanar_frames() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera), "no frame arrived");
    assert_eq!(camera.color_format(), ColorFormat::Yuv420SemiPlanar);
    let planar = camera.data(ColorFormat::Yuv420Planar).unwrap();
    assert_eq!(planar.width(), 320);
    assert_eq!(planar.data().len(), 320 * 240 * 3 / 2);
    drop(planar);
    camera.stop().unwrap();
}

#[test]
fn streams_planar_frames() {
    let source = SyntheticSource::new()
        .with_layout(RawLayout::Planar)
        .with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera), "no frame arrived");
    assert_eq!(camera.color_format(), ColorFormat::Yuv420Planar);
    camera.stop().unwrap();
}

#[test]
fn orientation_swaps_consumer_extents() {
    let source = SyntheticSource::new().with_orientation(90);
    let config = CameraConfig::new().with_resolution(640, 480);
    let camera = Camera::open(Box::new(source), &config).unwrap();
    assert_eq!(camera.width(), 480);
    assert_eq!(camera.height(), 640);
}

#[test]
fn start_twice_is_an_error() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let mut camera = Camera::open(Box::new(source), &CameraConfig::new()).unwrap();
    camera.start().unwrap();
    assert!(matches!(camera.start(), Err(CameraError::Device(_))));
    camera.stop().unwrap();
}

#[test]
fn stop_start_cycle_resumes_delivery() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera));
    camera.stop().unwrap();
    // Stop is idempotent.
    camera.stop().unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera), "no frame after restart");
    camera.stop().unwrap();
}

#[test]
fn stopped_camera_stops_delivering() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera));
    camera.stop().unwrap();
    let _ = camera.rgba();
    thread::sleep(Duration::from_millis(20));
    assert!(camera.rgba().is_none());
}

#[test]
fn frame_limit_caps_delivery() {
    let source = SyntheticSource::new()
        .with_frame_limit(1)
        .with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera), "the single frame never arrived");
    thread::sleep(Duration::from_millis(20));
    assert!(camera.rgba().is_none());
    camera.stop().unwrap();
}

#[test]
fn set_stride_validates_alignment() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    assert!(matches!(
        camera.set_stride(333),
        Err(CameraError::Image(_))
    ));
    // Aligned but no frame delivered yet.
    assert!(matches!(camera.set_stride(352), Err(CameraError::Frame(_))));
    camera.start().unwrap();
    assert!(poll_frame(&camera));
    camera.set_stride(352).unwrap();
    let mut restrided = false;
    for _ in 0..200 {
        if let Some(frame) = camera.rgba() {
            assert_eq!(frame.stride(), 352);
            restrided = true;
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(restrided, "no frame after restride");
    camera.stop().unwrap();
}

#[test]
fn data_requires_a_known_format() {
    let source = SyntheticSource::new().with_interval(Duration::from_millis(1));
    let config = CameraConfig::new().with_resolution(320, 240);
    let mut camera = Camera::open(Box::new(source), &config).unwrap();
    camera.start().unwrap();
    assert!(poll_frame(&camera));
    assert!(matches!(
        camera.data(ColorFormat::Unknown),
        Err(CameraError::Frame(_))
    ));
    camera.stop().unwrap();
}
