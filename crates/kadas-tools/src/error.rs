//! Map tool errors

use kadas_core::ItemError;
use kadas_raster::RasterError;
use thiserror::Error;

/// Map tool related errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ToolError {
    #[error(
        "No heightmap is defined in the project. Right-click a raster layer in the layer tree and select it to be used as heightmap."
    )]
    NoHeightmap,

    #[error("No item to operate on")]
    NoItem,

    #[error("Drawn item has no region geometry")]
    NoRegion,

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Item(#[from] ItemError),
}

/// Result type for map tool operations
pub type ToolResult<T> = Result<T, ToolError>;
