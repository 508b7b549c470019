//! Error types shared by map items and coordinate transforms

use thiserror::Error;

use crate::crs::Crs;

/// Map item related errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ItemError {
    #[error("No transform available from {from} to {to}")]
    Transform { from: Crs, to: Crs },

    #[error("Geometry not supported by {item}: {reason}")]
    UnsupportedGeometry { item: &'static str, reason: String },
}

/// Result type for map item operations
pub type ItemResult<T> = Result<T, ItemError>;
