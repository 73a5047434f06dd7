use alloc::string::String;
use enough::StopReason;

use crate::pixel::PixelLayout;

/// Errors from GIF encoding and decoding.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GifError {
    #[error("not a GIF stream: expected GIF87a or GIF89a signature")]
    InvalidSignature,

    #[error("input too short for GIF header and logical screen descriptor")]
    TruncatedHeader,

    #[error("unexpected end of input")]
    TruncatedStream,

    #[error("corrupt LZW stream: {0}")]
    CorruptLzwStream(String),

    #[error("palette index {index} out of range for palette of {len} colors")]
    PaletteIndexOutOfRange { index: u8, len: usize },

    #[error(
        "frame {width}x{height} at ({left}, {top}) does not fit canvas {canvas_width}x{canvas_height}"
    )]
    DimensionMismatch {
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        canvas_width: u16,
        canvas_height: u16,
    },

    #[error("memory limit exceeded: need {needed} bytes, limit is {limit}")]
    MemoryLimitExceeded { needed: u64, limit: u64 },

    #[error("invalid palette: {0}")]
    InvalidPalette(String),

    #[error("frame has no local color table and no global color table is present")]
    MissingColorTable,

    #[error("unknown block introducer 0x{0:02X}")]
    UnknownBlock(u8),

    #[error("pixel layout {0:?} cannot be used here")]
    UnsupportedLayout(PixelLayout),

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for GifError {
    fn from(r: StopReason) -> Self {
        GifError::Cancelled(r)
    }
}
