//! Persistent item layers

use std::sync::Arc;

use kadas_core::{
    CoordinateTransform, GeometryType, ItemId, MapItem, MapSettings, Rect, TransformDirection,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::feature_picker::{PickResult, PickSource};

/// Identifier of a layer
pub type LayerId = Uuid;

/// A layer that takes ownership of committed items
pub trait ItemLayer: PickSource + Send {
    fn name(&self) -> &str;

    /// Take ownership of a finished item
    fn add_item(&mut self, item: Box<dyn MapItem>);

    /// Request a redraw of the layer
    fn trigger_repaint(&mut self);
}

/// Layer shared between tools and the canvas
pub type SharedLayer = Arc<Mutex<dyn ItemLayer>>;

/// Item layer kept in memory
pub struct MemoryItemLayer {
    id: LayerId,
    name: String,
    items: Vec<Box<dyn MapItem>>,
    repaints: usize,
}

impl MemoryItemLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            items: Vec::new(),
            repaints: 0,
        }
    }

    /// Wrap into a shared layer, keeping a typed handle for inspection
    pub fn shared(self) -> (Arc<Mutex<MemoryItemLayer>>, SharedLayer) {
        let typed = Arc::new(Mutex::new(self));
        let shared: SharedLayer = typed.clone();
        (typed, shared)
    }

    pub fn items(&self) -> &[Box<dyn MapItem>] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&dyn MapItem> {
        self.items.iter().find(|item| item.id() == id).map(|item| item.as_ref())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn repaint_count(&self) -> usize {
        self.repaints
    }
}

impl std::fmt::Debug for MemoryItemLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryItemLayer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("items", &self.items.len())
            .finish()
    }
}

impl ItemLayer for MemoryItemLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn add_item(&mut self, item: Box<dyn MapItem>) {
        tracing::debug!("Layer '{}': added {} {}", self.name, item.item_name(), item.id());
        self.items.push(item);
    }

    fn trigger_repaint(&mut self) {
        self.repaints += 1;
    }
}

impl PickSource for MemoryItemLayer {
    fn layer_id(&self) -> LayerId {
        self.id
    }

    /// Topmost (most recently added) matching item wins
    fn pick(
        &self,
        rect: &Rect,
        settings: &MapSettings,
        transform: &dyn CoordinateTransform,
        filter: GeometryType,
    ) -> Option<PickResult> {
        self.items.iter().rev().find_map(|item| {
            let geometry = item.geometry()?;
            if !filter.accepts(geometry.geometry_type()) {
                return None;
            }
            let local = if item.crs() == &settings.crs {
                *rect
            } else {
                kadas_core::Geometry::Rectangle(*rect)
                    .transform(transform, &settings.crs, item.crs(), TransformDirection::Forward)
                    .ok()?
                    .bounding_box()
            };
            item.intersects(&local, settings).then(|| PickResult {
                layer: self.id,
                geometry,
                crs: item.crs().clone(),
                item_id: Some(item.id()),
            })
        })
    }
}
