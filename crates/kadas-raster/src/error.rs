//! Raster access and reduction errors

use thiserror::Error;

/// Raster related errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RasterError {
    #[error("Failed to open raster '{reference}': {reason}")]
    Open { reference: String, reason: String },

    #[error("Raster has no bands")]
    NoBands,

    #[error("Band {band} out of range, raster has {count} bands")]
    BandOutOfRange { band: usize, count: usize },

    #[error("Raster has no valid georeferencing transform")]
    InvalidGeoTransform,

    #[error("Region does not overlap the raster")]
    EmptyWindow,

    #[error("Region contains no raster samples")]
    EmptySelection,

    #[error("Region geometry is not areal: {0}")]
    UnsupportedRegion(String),

    #[error("Failed to read raster block: {0}")]
    Read(String),

    #[error("Reduction cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Result type for raster operations
pub type RasterResult<T> = Result<T, RasterError>;
