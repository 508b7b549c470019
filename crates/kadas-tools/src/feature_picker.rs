//! Picking existing features under the pointer

use glam::DVec2;
use kadas_core::{CoordinateTransform, Crs, Geometry, GeometryType, ItemId, MapSettings, Rect};

use crate::canvas::MapCanvas;
use crate::layer::LayerId;

/// Pick tolerance around the pointer, in pixels
pub const PICK_TOLERANCE: f64 = 5.0;

/// A picked feature
#[derive(Debug, Clone, PartialEq)]
pub struct PickResult {
    pub layer: LayerId,
    /// Geometry in `crs`
    pub geometry: Geometry,
    pub crs: Crs,
    /// Set when the feature is a map item
    pub item_id: Option<ItemId>,
}

/// A pickable layer
pub trait PickSource {
    fn layer_id(&self) -> LayerId;

    /// Topmost feature touching `rect` (display CRS) that passes `filter`
    fn pick(
        &self,
        rect: &Rect,
        settings: &MapSettings,
        transform: &dyn CoordinateTransform,
        filter: GeometryType,
    ) -> Option<PickResult>;
}

pub struct FeaturePicker;

impl FeaturePicker {
    /// Pick from the canvas layers, topmost layer first
    pub fn pick(
        canvas: &dyn MapCanvas,
        map_pos: DVec2,
        filter: GeometryType,
    ) -> Option<PickResult> {
        let settings = canvas.map_settings();
        let rect = Self::pick_rect(settings, map_pos);
        let result = canvas
            .layers()
            .iter()
            .find_map(|layer| layer.lock().pick(&rect, settings, canvas.transform(), filter));
        tracing::debug!(
            "Pick at {:?} ({:?}): {:?}",
            map_pos,
            filter,
            result.as_ref().map(|r| r.item_id)
        );
        result
    }

    /// Pick from explicit sources, first source first
    pub fn pick_from(
        sources: &[&dyn PickSource],
        settings: &MapSettings,
        transform: &dyn CoordinateTransform,
        map_pos: DVec2,
        filter: GeometryType,
    ) -> Option<PickResult> {
        let rect = Self::pick_rect(settings, map_pos);
        sources
            .iter()
            .find_map(|source| source.pick(&rect, settings, transform, filter))
    }

    fn pick_rect(settings: &MapSettings, map_pos: DVec2) -> Rect {
        Rect::from_point(map_pos).buffered(settings.pixels_to_map(PICK_TOLERANCE))
    }
}
