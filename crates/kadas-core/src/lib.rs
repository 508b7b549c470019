//! Kadas Map Tools Core
//!
//! This crate contains the host-independent core of the map annotation tools:
//! - Geometry: rectangles, region geometries, winding-rule containment
//! - Crs: coordinate reference system ids and the transform capability
//! - History: linear undo/redo over cloned state snapshots
//! - Item: the `MapItem` drawing protocol and its shape variants

pub mod crs;
pub mod error;
pub mod geometry;
pub mod history;
pub mod item;

pub use crs::*;
pub use error::*;
pub use geometry::*;
pub use history::*;
pub use item::*;
