/// Requested capture parameters.
///
/// The builder methods express preferences; the source negotiates the
/// closest mode it can actually deliver and reports the result in its
/// [`StreamInfo`](crate::StreamInfo).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    index: usize,
    width: usize,
    height: usize,
}

impl CameraConfig {
    pub fn new() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
        }
    }

    /// Device index to open.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Preferred capture resolution.
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::new()
    }
}
