//! Map items: drawable shapes created interactively on the map canvas
//!
//! Every shape follows the same drawing protocol:
//! - `start_part` leaves `Empty` (to `Drawing`, or straight to `Finished`
//!   for single-point shapes)
//! - `set_current_point` / `set_current_attributes` move the uncommitted
//!   part of the geometry
//! - `continue_part` commits a vertex and reports whether more are accepted
//! - `end_part` fixes the geometry
//!
//! Callers drive the protocol through `dyn MapItem` and never need to know
//! the concrete shape. Snapshots of the drawing state are [`ItemState`]
//! values which the undo history stores and hands back on undo/redo.

mod circle;
mod picture;
mod polygon;
mod rectangle;
mod state;
mod symbol;

pub use circle::CircleItem;
pub use picture::{DEFAULT_PICTURE_OFFSET, PictureItem};
pub use polygon::PolygonItem;
pub use rectangle::RectangleItem;
pub use state::*;
pub use symbol::{DEFAULT_SYMBOL_SIZE, SymbolItem};

use glam::DVec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crs::Crs;
use crate::geometry::{Geometry, Rect};

/// Identifier of a map item
pub type ItemId = Uuid;

/// Attribute values in the order of [`MapItem::draw_attribs`]
pub type AttribValues = Vec<f64>;

/// Distance in pixels within which a node can be grabbed for editing
pub const NODE_PICK_TOLERANCE: f64 = 5.0;

/// A numeric attribute exposed for keyboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericAttribute {
    /// Display name (e.g. "x", "r")
    pub name: String,
    /// Number of decimals shown
    pub decimals: usize,
}

impl NumericAttribute {
    pub fn new(name: impl Into<String>, decimals: usize) -> Self {
        Self {
            name: name.into(),
            decimals,
        }
    }
}

/// View parameters of the canvas an item is drawn on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    /// Display coordinate reference system
    pub crs: Crs,
    /// Visible extent in display coordinates
    pub extent: Rect,
    /// Size of one screen pixel in map units
    pub map_units_per_pixel: f64,
}

impl MapSettings {
    pub fn new(crs: Crs, extent: Rect, map_units_per_pixel: f64) -> Self {
        Self {
            crs,
            extent,
            map_units_per_pixel,
        }
    }

    /// Pixel distance converted to map units
    pub fn pixels_to_map(&self, pixels: f64) -> f64 {
        pixels * self.map_units_per_pixel
    }
}

/// Context of an edit operation on a finished item
#[derive(Debug, Clone, PartialEq)]
pub struct EditContext {
    /// Index of the grabbed node in [`MapItem::nodes`]
    pub node: usize,
    /// Position of the grabbed node
    pub position: DVec2,
    /// Attributes editable through the numeric input while editing
    pub attributes: Vec<NumericAttribute>,
}

/// A drawable shape driven by the drawing protocol
pub trait MapItem: Send + Sync {
    /// Unique identifier
    fn id(&self) -> ItemId;

    /// Human readable name of the shape kind
    fn item_name(&self) -> &'static str;

    /// Coordinate reference system of the item geometry
    fn crs(&self) -> &Crs;

    /// Current draw status
    fn draw_status(&self) -> DrawStatus;

    /// Snapshot of the current state
    fn state(&self) -> ItemState;

    /// Adopt a snapshot previously taken from an item of the same kind
    fn restore_state(&mut self, state: &ItemState);

    /// Discard all geometry and return to `Empty`
    fn reset(&mut self);

    // ============== Drawing Protocol ==============

    /// Start a part at `first_point`; returns whether further points are accepted
    fn start_part(&mut self, first_point: DVec2, settings: &MapSettings) -> bool;

    /// Start a part from numeric attribute values
    fn start_part_from_attributes(&mut self, values: &[f64], settings: &MapSettings) -> bool;

    /// Move the uncommitted point of the part being drawn
    fn set_current_point(&mut self, p: DVec2, settings: &MapSettings);

    /// Move the uncommitted point from numeric attribute values
    fn set_current_attributes(&mut self, values: &[f64], settings: &MapSettings);

    /// Commit the current point; returns false once the geometry is complete
    fn continue_part(&mut self, settings: &MapSettings) -> bool;

    /// Finish drawing
    fn end_part(&mut self);

    /// Set the current point and commit it
    fn set_next_point(&mut self, p: DVec2, settings: &MapSettings) -> bool {
        self.set_current_point(p, settings);
        self.continue_part(settings)
    }

    /// Apply attribute values typed while drawing
    fn change_attribute_values(&mut self, values: &[f64], settings: &MapSettings) {
        self.set_current_attributes(values, settings);
    }

    /// Commit attribute values typed while drawing
    fn accept_attribute_values(&mut self, settings: &MapSettings) -> bool {
        self.continue_part(settings)
    }

    // ============== Numeric Attributes ==============

    /// Attributes available for numeric entry in the current draw status
    fn draw_attribs(&self) -> Vec<NumericAttribute>;

    /// Attribute values corresponding to a pointer position
    fn draw_attribs_from_position(&self, pos: DVec2) -> AttribValues;

    /// Pointer position corresponding to attribute values
    fn position_from_draw_attribs(&self, values: &[f64]) -> DVec2;

    // ============== Geometry Queries ==============

    /// Bounding box in item coordinates
    fn bounding_box(&self) -> Rect;

    /// Handles of the item, used for hit-testing and editing
    fn nodes(&self, settings: &MapSettings) -> Vec<DVec2>;

    /// Whether the item touches `rect`
    fn intersects(&self, rect: &Rect, settings: &MapSettings) -> bool;

    /// Reference position of the item
    fn position(&self) -> DVec2;

    /// Move the item so that its reference position is `pos`
    fn set_position(&mut self, pos: DVec2);

    /// Geometry of the item, `None` while empty
    fn geometry(&self) -> Option<Geometry>;

    // ============== Editing ==============

    /// Find the node under `pos`, if any
    fn edit_context(&self, pos: DVec2, settings: &MapSettings) -> Option<EditContext> {
        if self.draw_status() != DrawStatus::Finished {
            return None;
        }
        let tolerance = settings.pixels_to_map(NODE_PICK_TOLERANCE);
        self.nodes(settings)
            .into_iter()
            .enumerate()
            .filter(|(_, node)| node.distance(pos) <= tolerance)
            .min_by(|(_, a), (_, b)| a.distance(pos).total_cmp(&b.distance(pos)))
            .map(|(node, position)| EditContext {
                node,
                position,
                attributes: xy_attribs(),
            })
    }

    /// Move the node described by `context` to `new_point`
    fn edit(&mut self, context: &EditContext, new_point: DVec2, settings: &MapSettings);

    /// Attribute values while editing, for a pointer position
    fn edit_attribs_from_position(&self, _context: &EditContext, pos: DVec2) -> AttribValues {
        vec![pos.x, pos.y]
    }

    /// Pointer position while editing, for attribute values
    fn position_from_edit_attribs(&self, _context: &EditContext, values: &[f64]) -> DVec2 {
        point_from_values(values)
    }

    /// Build a finished part from an existing geometry
    fn add_part_from_geometry(&mut self, _geometry: &Geometry) -> bool {
        false
    }
}

/// Check a protocol precondition
///
/// Violations are caller bugs: they assert in debug builds and are logged
/// and ignored in release builds.
pub(crate) fn expect_status(
    item: &'static str,
    actual: DrawStatus,
    expected: DrawStatus,
    operation: &str,
) -> bool {
    if actual == expected {
        return true;
    }
    tracing::warn!(
        "{}: {} called in {:?} state, expected {:?}",
        item,
        operation,
        actual,
        expected
    );
    debug_assert!(
        false,
        "{item}: {operation} called in {actual:?} state, expected {expected:?}"
    );
    false
}

/// First two attribute values as a point, missing values read as zero
pub(crate) fn point_from_values(values: &[f64]) -> DVec2 {
    DVec2::new(
        values.first().copied().unwrap_or_default(),
        values.get(1).copied().unwrap_or_default(),
    )
}

/// The `x`/`y` attribute pair shared by point-driven shapes
pub(crate) fn xy_attribs() -> Vec<NumericAttribute> {
    vec![NumericAttribute::new("x", 0), NumericAttribute::new("y", 0)]
}

/// Rotate `p` counter-clockwise around `origin` by `angle` degrees
pub(crate) fn rotate_about(p: DVec2, origin: DVec2, angle: f64) -> DVec2 {
    origin + DVec2::from_angle(angle.to_radians()).rotate(p - origin)
}
