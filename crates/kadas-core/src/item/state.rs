//! Item state snapshots

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Lifecycle of an interactively created shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DrawStatus {
    /// Nothing drawn yet
    #[default]
    Empty,
    /// A part is being drawn
    Drawing,
    /// Geometry is fixed
    Finished,
}

/// State of a symbol (screen-sized icon anchored at a map position)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SymbolState {
    pub draw_status: DrawStatus,
    /// Anchor position in item coordinates
    pub pos: DVec2,
    /// Rotation in degrees
    pub angle: f64,
    /// Size in pixels
    pub size: DVec2,
}

/// State of a picture (framed image pinned to a map position)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PictureState {
    pub draw_status: DrawStatus,
    /// Position the frame points to
    pub pos: DVec2,
    /// Rotation in degrees
    pub angle: f64,
    /// Frame size in pixels
    pub size: DVec2,
}

/// State of a circle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CircleState {
    pub draw_status: DrawStatus,
    pub center: DVec2,
    pub radius: f64,
}

/// State of a polygon; while drawing the last vertex follows the pointer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonState {
    pub draw_status: DrawStatus,
    pub points: Vec<DVec2>,
}

/// State of an axis-aligned rectangle spanned by two corners
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RectangleState {
    pub draw_status: DrawStatus,
    pub p1: DVec2,
    pub p2: DVec2,
}

/// Snapshot of a map item's drawing state, one variant per shape kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemState {
    Symbol(SymbolState),
    Picture(PictureState),
    Circle(CircleState),
    Polygon(PolygonState),
    Rectangle(RectangleState),
}

impl ItemState {
    /// Draw status of the snapshot
    pub fn draw_status(&self) -> DrawStatus {
        match self {
            ItemState::Symbol(s) => s.draw_status,
            ItemState::Picture(s) => s.draw_status,
            ItemState::Circle(s) => s.draw_status,
            ItemState::Polygon(s) => s.draw_status,
            ItemState::Rectangle(s) => s.draw_status,
        }
    }

    /// Name of the shape kind the snapshot belongs to
    pub fn kind(&self) -> &'static str {
        match self {
            ItemState::Symbol(_) => "Symbol",
            ItemState::Picture(_) => "Picture",
            ItemState::Circle(_) => "Circle",
            ItemState::Polygon(_) => "Polygon",
            ItemState::Rectangle(_) => "Rectangle",
        }
    }
}

/// Report a snapshot of the wrong kind handed to `restore_state`
pub(crate) fn kind_mismatch(item: &'static str, state: &ItemState) {
    tracing::warn!("{}: ignoring {} state", item, state.kind());
    debug_assert!(false, "{item}: cannot restore {} state", state.kind());
}
