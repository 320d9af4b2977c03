//! Error types for the scan pipeline
//!
//! Only [`ScanError::DeviceUnavailable`] and tooling IO errors are meant to
//! reach a user-visible layer. Per-frame misses (`NotFound`, `ExtractionEmpty`)
//! and bad crop geometry (`OutOfBounds`) are absorbed by the scan loop.

/// Errors produced by the pipeline and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Camera open or permission failure
    #[error("camera device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Crop or extraction geometry does not intersect the source
    #[error("region {width}x{height} at ({x}, {y}) is out of bounds")]
    OutOfBounds {
        /// Requested left edge
        x: i32,
        /// Requested top edge
        y: i32,
        /// Requested width
        width: i32,
        /// Requested height
        height: i32,
    },

    /// The decoder found no symbol in the buffer
    #[error("no symbol found")]
    NotFound,

    /// No contour or template candidate met the extraction policy
    #[error("no candidate region found")]
    ExtractionEmpty,

    /// A barcode format name could not be resolved
    #[error("invalid barcode format: {0:?}")]
    InvalidFormat(String),

    /// An operation that needs an active stream was called while idle
    #[error("scan loop is not streaming")]
    NotStreaming,

    /// Image encode/decode failure (tooling only)
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// File system failure (tooling only)
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScanError {
    /// True for outcomes that are expected every frame and never surfaced
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::NotFound | Self::ExtractionEmpty)
    }
}

/// Result alias used across the crate
pub type Result<T, E = ScanError> = std::result::Result<T, E>;
