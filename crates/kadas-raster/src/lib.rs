//! Kadas Raster
//!
//! Raster access and windowed reduction for the map tools:
//! - GeoTransform: the six-coefficient pixel/geographic mapping
//! - Window: pixel windows covering a region, split into scan-ordered tiles
//! - Source: the dataset/provider capability and an in-memory raster
//! - Region: bounding box plus winding-rule polygon mask
//! - Reduce: parallel per-tile min/max with a deterministic merge
//! - Task: the reduction on a cancelable background thread

pub mod error;
pub mod geotransform;
pub mod reduce;
pub mod region;
pub mod source;
pub mod task;
pub mod window;

pub use error::*;
pub use geotransform::*;
pub use reduce::*;
pub use region::*;
pub use source::*;
pub use task::*;
pub use window::*;
