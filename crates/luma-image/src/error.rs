use std::fmt;

#[derive(Debug)]
pub enum ImageError {
    /// Bad dimensions, stride, or format precondition.
    InvalidArgument(String),
    /// Backing allocation failed.
    OutOfMemory,
    /// The format/operation combination is not supported.
    NotImplemented(&'static str),
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            ImageError::OutOfMemory => write!(f, "out of memory"),
            ImageError::NotImplemented(what) => write!(f, "not implemented: {what}"),
        }
    }
}

impl std::error::Error for ImageError {}
