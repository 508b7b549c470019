//! Map canvas capability and a headless implementation

use glam::DVec2;
use kadas_core::{CoordinateTransform, IdentityTransform, ItemId, MapSettings};

use crate::layer::SharedLayer;

/// What a map tool needs from the canvas it runs on
pub trait MapCanvas {
    /// Current view parameters, including the display CRS
    fn map_settings(&self) -> &MapSettings;

    /// Coordinate transform capability
    fn transform(&self) -> &dyn CoordinateTransform;

    /// Layers, topmost first
    fn layers(&self) -> &[SharedLayer];

    /// Register an item for transient (not yet committed) rendering
    fn add_transient_item(&mut self, id: ItemId);

    fn remove_transient_item(&mut self, id: ItemId);

    /// Move the mouse cursor programmatically, in display CRS
    fn set_cursor_position(&mut self, map_pos: DVec2);
}

/// Canvas without a window, used for replay and tests
pub struct HeadlessCanvas {
    settings: MapSettings,
    transform: Box<dyn CoordinateTransform>,
    layers: Vec<SharedLayer>,
    transient: Vec<ItemId>,
    cursor: Option<DVec2>,
}

impl HeadlessCanvas {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            settings,
            transform: Box::new(IdentityTransform),
            layers: Vec::new(),
            transient: Vec::new(),
            cursor: None,
        }
    }

    pub fn with_transform(mut self, transform: impl CoordinateTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    /// Add a layer on top of the existing ones
    pub fn add_layer(&mut self, layer: SharedLayer) {
        self.layers.insert(0, layer);
    }

    pub fn set_map_settings(&mut self, settings: MapSettings) {
        self.settings = settings;
    }

    pub fn transient_items(&self) -> &[ItemId] {
        &self.transient
    }

    pub fn cursor_position(&self) -> Option<DVec2> {
        self.cursor
    }
}

impl MapCanvas for HeadlessCanvas {
    fn map_settings(&self) -> &MapSettings {
        &self.settings
    }

    fn transform(&self) -> &dyn CoordinateTransform {
        self.transform.as_ref()
    }

    fn layers(&self) -> &[SharedLayer] {
        &self.layers
    }

    fn add_transient_item(&mut self, id: ItemId) {
        if !self.transient.contains(&id) {
            self.transient.push(id);
        }
    }

    fn remove_transient_item(&mut self, id: ItemId) {
        self.transient.retain(|t| *t != id);
    }

    fn set_cursor_position(&mut self, map_pos: DVec2) {
        self.cursor = Some(map_pos);
    }
}
