//! Interactive item creation tool
//!
//! Translates pointer and key events into the `MapItem` drawing protocol:
//! - Left press starts the item, adds a vertex, or finishes it when the
//!   item accepts no more points
//! - Right press finishes a drawing item, or asks to exit the tool
//! - Escape discards the part being drawn, or asks to exit the tool
//! - Ctrl+Z / Ctrl+Y walk the undo history
//!
//! A history snapshot is pushed on every discrete step (start, vertex,
//! finish), never on pointer moves.

use std::sync::Arc;

use glam::DVec2;
use kadas_core::{
    Crs, DrawStatus, Geometry, ItemError, ItemState, MapItem, MapSettings, StateHistory,
    TransformDirection,
};

use crate::canvas::MapCanvas;
use crate::config::ToolsConfig;
use crate::error::{ToolError, ToolResult};
use crate::events::{Key, KeyEvent, MapMouseEvent, MouseButton, ToolEvent};
use crate::layer::SharedLayer;
use crate::numeric_input::NumericInput;

/// Creates a fresh, empty item
pub type ItemFactory = Arc<dyn Fn() -> Box<dyn MapItem> + Send + Sync>;

/// Map tool drawing one item after the other
pub struct CreateItemTool {
    factory: ItemFactory,
    /// Receives finished items; `None` discards them
    layer: Option<SharedLayer>,
    item: Option<Box<dyn MapItem>>,
    history: StateHistory<ItemState>,
    history_limit: usize,
    show_numeric_input: bool,
    input: Option<NumericInput>,
    undo_redo_enabled: bool,
    /// Set after a programmatic cursor move to swallow the echoed move event
    ignore_next_move: bool,
    active: bool,
    events: Vec<ToolEvent>,
}

impl CreateItemTool {
    pub fn new(factory: ItemFactory, layer: Option<SharedLayer>, config: &ToolsConfig) -> Self {
        Self {
            factory,
            layer,
            item: None,
            history: StateHistory::new(config.history_limit),
            history_limit: config.history_limit,
            show_numeric_input: config.show_numeric_input,
            input: None,
            undo_redo_enabled: true,
            ignore_next_move: false,
            active: false,
            events: Vec::new(),
        }
    }

    // ============== Lifecycle ==============

    pub fn activate(&mut self, canvas: &mut dyn MapCanvas) {
        self.history = StateHistory::new(self.history_limit);
        self.create_item(canvas);
        self.active = true;
        tracing::debug!("Create item tool activated");
    }

    /// Commit a finished item, discard anything else
    pub fn deactivate(&mut self, canvas: &mut dyn MapCanvas) {
        if self.draw_status() == Some(DrawStatus::Finished) {
            self.commit_item(canvas);
        }
        self.cleanup(canvas);
        self.history.clear();
        self.input = None;
        self.active = false;
        tracing::debug!("Create item tool deactivated");
    }

    /// Commit the current item and start a fresh one
    pub fn reset(&mut self, canvas: &mut dyn MapCanvas) {
        self.commit_item(canvas);
        self.cleanup(canvas);
        self.create_item(canvas);
    }

    /// Discard the current item without committing and start a fresh one
    pub fn clear(&mut self, canvas: &mut dyn MapCanvas) {
        self.cleanup(canvas);
        self.create_item(canvas);
    }

    // ============== Input Events ==============

    pub fn press(&mut self, canvas: &mut dyn MapCanvas, event: &MapMouseEvent) {
        match event.button {
            MouseButton::Left => self.add_point(canvas, event.map_pos),
            MouseButton::Right => {
                if self.draw_status() == Some(DrawStatus::Drawing) {
                    self.finish_item();
                } else {
                    self.events.push(ToolEvent::ExitRequested);
                }
            }
            MouseButton::Middle => {}
        }
    }

    pub fn mouse_move(&mut self, canvas: &mut dyn MapCanvas, event: &MapMouseEvent) {
        if self.ignore_next_move {
            self.ignore_next_move = false;
            return;
        }
        let Some(pos) = self.to_item_crs(canvas, event.map_pos) else {
            return;
        };
        let settings = canvas.map_settings();
        let Some(item) = self.item.as_mut() else {
            return;
        };

        if item.draw_status() == DrawStatus::Drawing {
            item.set_current_point(pos, settings);
        }
        if let Some(input) = self.input.as_mut() {
            input.set_values(&item.draw_attribs_from_position(pos));
            input.show_at(event.screen_pos);
        }
    }

    pub fn release(&mut self, _canvas: &mut dyn MapCanvas, _event: &MapMouseEvent) {}

    pub fn key(&mut self, _canvas: &mut dyn MapCanvas, event: &KeyEvent) {
        if event.key == Key::Escape {
            match self.item.as_mut() {
                Some(item) if item.draw_status() == DrawStatus::Drawing => {
                    tracing::debug!("Discarding {} part", item.item_name());
                    item.reset();
                    self.sync_input();
                }
                _ => self.events.push(ToolEvent::ExitRequested),
            }
        } else if self.undo_redo_enabled && event.is_ctrl_char('z') {
            self.undo();
        } else if self.undo_redo_enabled && event.is_ctrl_char('y') {
            self.redo();
        }
    }

    /// Step back in the history and adopt the snapshot
    pub fn undo(&mut self) {
        if let (Some(state), Some(item)) = (self.history.undo(), self.item.as_mut()) {
            item.restore_state(state);
        }
        self.sync_input();
    }

    /// Step forward in the history and adopt the snapshot
    pub fn redo(&mut self) {
        if let (Some(state), Some(item)) = (self.history.redo(), self.item.as_mut()) {
            item.restore_state(state);
        }
        self.sync_input();
    }

    // ============== Numeric Input ==============

    /// Apply the current field values after the user edited one of them
    pub fn input_changed(&mut self, canvas: &mut dyn MapCanvas) {
        let (Some(input), Some(item)) = (self.input.as_ref(), self.item.as_mut()) else {
            return;
        };
        let values = input.values();

        // Moving the cursor echoes a move event in integral screen pixels;
        // dropping it keeps the typed value exact
        self.ignore_next_move = true;
        let item_pos = item.position_from_draw_attribs(&values);
        let map_pos = canvas
            .transform()
            .transform(
                item_pos,
                &canvas.map_settings().crs,
                item.crs(),
                TransformDirection::Reverse,
            )
            .unwrap_or(item_pos);
        canvas.set_cursor_position(map_pos);

        if item.draw_status() == DrawStatus::Drawing {
            item.change_attribute_values(&values, canvas.map_settings());
        }
    }

    /// Commit the field values (Enter in a field)
    pub fn accept_input(&mut self, canvas: &mut dyn MapCanvas) {
        let Some(values) = self.input.as_ref().map(NumericInput::values) else {
            return;
        };
        match self.draw_status() {
            Some(DrawStatus::Empty) => self.start_item_from_attributes(canvas, &values),
            Some(DrawStatus::Drawing) => {
                let settings = canvas.map_settings();
                let more = self
                    .item
                    .as_mut()
                    .is_some_and(|item| item.accept_attribute_values(settings));
                if more {
                    self.push_state();
                } else {
                    self.finish_item();
                }
            }
            Some(DrawStatus::Finished) => {
                self.reset(canvas);
                self.start_item_from_attributes(canvas, &values);
            }
            None => {}
        }
    }

    // ============== Programmatic Creation ==============

    /// Finish the current item from an existing geometry given in `crs`
    pub fn add_part_from_geometry(
        &mut self,
        canvas: &mut dyn MapCanvas,
        geometry: &Geometry,
        crs: &Crs,
    ) -> ToolResult<()> {
        if self.draw_status() == Some(DrawStatus::Finished) {
            self.reset(canvas);
        }
        let item = self.item.as_mut().ok_or(ToolError::NoItem)?;
        let local = geometry.transform(
            canvas.transform(),
            crs,
            item.crs(),
            TransformDirection::Forward,
        )?;
        if !item.add_part_from_geometry(&local) {
            return Err(ItemError::UnsupportedGeometry {
                item: item.item_name(),
                reason: format!("{:?}", local.geometry_type()),
            }
            .into());
        }
        self.finish_item();
        Ok(())
    }

    // ============== Accessors ==============

    /// Replace the factory; takes effect with the next created item
    pub fn set_item_factory(&mut self, factory: ItemFactory) {
        self.factory = factory;
    }

    pub fn set_undo_redo_enabled(&mut self, enabled: bool) {
        self.undo_redo_enabled = enabled;
    }

    pub fn item(&self) -> Option<&dyn MapItem> {
        self.item.as_deref()
    }

    pub fn draw_status(&self) -> Option<DrawStatus> {
        self.item.as_ref().map(|item| item.draw_status())
    }

    pub fn history(&self) -> &StateHistory<ItemState> {
        &self.history
    }

    pub fn numeric_input(&self) -> Option<&NumericInput> {
        self.input.as_ref()
    }

    pub fn numeric_input_mut(&mut self) -> Option<&mut NumericInput> {
        self.input.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Drain the notifications emitted since the last call
    pub fn take_events(&mut self) -> Vec<ToolEvent> {
        std::mem::take(&mut self.events)
    }

    // ============== Internals ==============

    fn add_point(&mut self, canvas: &mut dyn MapCanvas, map_pos: DVec2) {
        let Some(pos) = self.to_item_crs(canvas, map_pos) else {
            return;
        };
        match self.draw_status() {
            Some(DrawStatus::Empty) => self.start_item(canvas.map_settings(), pos),
            Some(DrawStatus::Drawing) => {
                let settings = canvas.map_settings();
                let more = self
                    .item
                    .as_mut()
                    .is_some_and(|item| item.set_next_point(pos, settings));
                if more {
                    self.push_state();
                } else {
                    self.finish_item();
                }
            }
            Some(DrawStatus::Finished) => {
                self.reset(canvas);
                self.start_item(canvas.map_settings(), pos);
            }
            None => {}
        }
    }

    fn create_item(&mut self, canvas: &mut dyn MapCanvas) {
        let item = (self.factory)();
        canvas.add_transient_item(item.id());
        self.history.clear();
        tracing::debug!("Creating {} {}", item.item_name(), item.id());
        self.events.push(ToolEvent::CreationStarted { item: item.id() });
        self.item = Some(item);
        self.sync_input();
    }

    fn start_item(&mut self, settings: &MapSettings, pos: DVec2) {
        let Some(item) = self.item.as_mut() else {
            return;
        };
        if item.start_part(pos, settings) {
            self.push_state();
        } else {
            self.finish_item();
        }
    }

    fn start_item_from_attributes(&mut self, canvas: &dyn MapCanvas, values: &[f64]) {
        let Some(item) = self.item.as_mut() else {
            return;
        };
        if item.start_part_from_attributes(values, canvas.map_settings()) {
            self.push_state();
        } else {
            self.finish_item();
        }
    }

    fn finish_item(&mut self) {
        let Some(item) = self.item.as_mut() else {
            return;
        };
        item.end_part();
        let (id, state) = (item.id(), item.state());
        tracing::debug!("Finished {} {}", item.item_name(), id);
        self.history.push(state.clone());
        self.events.push(ToolEvent::CreationFinished { item: id, state });
        self.sync_input();
    }

    /// Hand the item over to the layer; without a layer it is dropped
    fn commit_item(&mut self, canvas: &mut dyn MapCanvas) {
        let Some(item) = self.item.take() else {
            return;
        };
        canvas.remove_transient_item(item.id());
        match &self.layer {
            Some(layer) => {
                tracing::info!("Committing {} {}", item.item_name(), item.id());
                let mut layer = layer.lock();
                layer.add_item(item);
                layer.trigger_repaint();
            }
            None => tracing::debug!("No target layer, dropping {} {}", item.item_name(), item.id()),
        }
    }

    fn cleanup(&mut self, canvas: &mut dyn MapCanvas) {
        if let Some(item) = self.item.take() {
            canvas.remove_transient_item(item.id());
        }
    }

    fn push_state(&mut self) {
        if let Some(item) = self.item.as_ref() {
            self.history.push(item.state());
        }
        self.sync_input();
    }

    /// Match the numeric fields to the attributes of the current item
    ///
    /// The attribute set depends on the item kind and may change with its
    /// draw status.
    fn sync_input(&mut self) {
        if !self.show_numeric_input {
            return;
        }
        let Some(item) = self.item.as_ref() else {
            return;
        };
        let attributes = item.draw_attribs();
        match self.input.as_mut() {
            Some(input) => input.set_attributes(&attributes),
            None => self.input = Some(NumericInput::new(&attributes)),
        }
    }

    /// Canvas position in the item's CRS
    fn to_item_crs(&self, canvas: &dyn MapCanvas, map_pos: DVec2) -> Option<DVec2> {
        let item = self.item.as_ref()?;
        canvas
            .transform()
            .transform(
                map_pos,
                &canvas.map_settings().crs,
                item.crs(),
                TransformDirection::Forward,
            )
            .inspect_err(|e| tracing::warn!("Ignoring pointer event: {}", e))
            .ok()
    }
}
