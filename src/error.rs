use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("channel count must be 1 or 2 (mapping family 0)")]
    ErrUnsupportedChannelCount,
    #[error("stream region extends past the end of the source")]
    ErrRegionOutOfBounds,
    #[error("buffer can't hold OggS page")]
    ErrPageBufferTooSmall,
    #[error("buffer can't hold stream headers")]
    ErrHeadBufferTooSmall,

    #[allow(non_camel_case_types)]
    #[error("{0}")]
    Io(#[source] IoError),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}
