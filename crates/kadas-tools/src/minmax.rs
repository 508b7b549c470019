//! Min/max tool: locate the lowest and highest heightmap sample in a drawn region
//!
//! The region is drawn with an inner `CreateItemTool` (rectangle, polygon or
//! circle) or picked from an existing polygon feature. When the region is
//! finished the heightmap is reduced over it and two pins mark the results.
//! The drawn region itself is never committed to a layer.

use std::sync::Arc;

use glam::DVec2;
use kadas_core::{
    CircleItem, Crs, Geometry, GeometryType, MapItem, PolygonItem, RectangleItem, SymbolItem,
    TransformDirection,
};
use kadas_raster::{
    Extremum, MinMaxTask, RasterError, RasterExtrema, RasterProvider, ReduceOptions, Region,
    reduce_min_max,
};
use serde::{Deserialize, Serialize};

use crate::canvas::MapCanvas;
use crate::config::{AppConfig, MinMaxConfig};
use crate::create_item::{CreateItemTool, ItemFactory};
use crate::error::{ToolError, ToolResult};
use crate::events::{KeyEvent, MapMouseEvent, ToolEvent};
use crate::feature_picker::FeaturePicker;

/// Icon of the pin marking the minimum, pointing up at it
pub const MIN_PIN_ICON: &str = "icons/tri_up.svg";
/// Icon of the pin marking the maximum, pointing down at it
pub const MAX_PIN_ICON: &str = "icons/tri_down.svg";

/// Shape used to select the region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    #[default]
    Rectangle,
    Polygon,
    Circle,
}

impl FilterType {
    /// Factory creating empty region items in `crs`
    pub fn item_factory(self, crs: Crs) -> ItemFactory {
        match self {
            FilterType::Rectangle => {
                Arc::new(move || Box::new(RectangleItem::new(crs.clone())) as Box<dyn MapItem>)
            }
            FilterType::Polygon => {
                Arc::new(move || Box::new(PolygonItem::new(crs.clone())) as Box<dyn MapItem>)
            }
            FilterType::Circle => {
                Arc::new(move || Box::new(CircleItem::new(crs.clone())) as Box<dyn MapItem>)
            }
        }
    }
}

/// Extrema of the last reduction
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxResult {
    pub min: Extremum,
    pub max: Extremum,
    /// Minimum position in the canvas CRS
    pub min_pos: DVec2,
    /// Maximum position in the canvas CRS
    pub max_pos: DVec2,
}

struct PendingReduction {
    task: MinMaxTask,
    raster_crs: Crs,
}

/// Everything needed to reduce, resolved from the drawn region
struct Prepared {
    reference: String,
    region: Region,
    raster_crs: Crs,
}

/// Map tool reporting the lowest and highest heightmap sample in a region
///
/// Owns the two result pins; they stay on the canvas until the next
/// failed computation or until the tool is deactivated.
pub struct MinMaxTool {
    inner: CreateItemTool,
    provider: Arc<dyn RasterProvider>,
    config: MinMaxConfig,
    filter: FilterType,
    pick_mode: bool,
    /// Reduce on a background thread, results are collected by `poll`
    background: bool,
    pending: Option<PendingReduction>,
    pin_min: Option<SymbolItem>,
    pin_max: Option<SymbolItem>,
    result: Option<MinMaxResult>,
    events: Vec<ToolEvent>,
}

impl MinMaxTool {
    pub fn new(provider: Arc<dyn RasterProvider>, config: &AppConfig) -> Self {
        let filter = FilterType::default();
        Self {
            inner: CreateItemTool::new(filter.item_factory(Crs::default()), None, &config.tools),
            provider,
            config: config.minmax.clone(),
            filter,
            pick_mode: false,
            background: false,
            pending: None,
            pin_min: None,
            pin_max: None,
            result: None,
            events: Vec::new(),
        }
    }

    pub fn set_background(&mut self, background: bool) {
        self.background = background;
    }

    pub fn set_heightmap(&mut self, reference: Option<String>) {
        self.config.heightmap = reference;
    }

    // ============== Lifecycle ==============

    pub fn activate(&mut self, canvas: &mut dyn MapCanvas) {
        let crs = canvas.map_settings().crs.clone();
        self.inner.set_item_factory(self.filter.item_factory(crs));
        self.inner.activate(canvas);
        self.process_inner_events(canvas);
    }

    pub fn deactivate(&mut self, canvas: &mut dyn MapCanvas) {
        if let Some(pending) = self.pending.take() {
            pending.task.cancel();
        }
        self.inner.deactivate(canvas);
        self.remove_pins(canvas);
        self.pick_mode = false;
        self.process_inner_events(canvas);
    }

    /// Switch the region shape, discarding any region being drawn
    pub fn set_filter_type(&mut self, canvas: &mut dyn MapCanvas, filter: FilterType) {
        self.filter = filter;
        let crs = canvas.map_settings().crs.clone();
        self.inner.set_item_factory(filter.item_factory(crs));
        if self.inner.is_active() {
            self.inner.clear(canvas);
        }
        tracing::debug!("Min/max filter set to {:?}", filter);
    }

    /// Take the region from the next picked polygon feature
    pub fn request_pick(&mut self) {
        self.pick_mode = true;
    }

    // ============== Input Events ==============

    pub fn press(&mut self, canvas: &mut dyn MapCanvas, event: &MapMouseEvent) {
        if !self.pick_mode {
            self.inner.press(canvas, event);
            self.process_inner_events(canvas);
        }
    }

    pub fn mouse_move(&mut self, canvas: &mut dyn MapCanvas, event: &MapMouseEvent) {
        if !self.pick_mode {
            self.inner.mouse_move(canvas, event);
            self.process_inner_events(canvas);
        }
    }

    pub fn release(&mut self, canvas: &mut dyn MapCanvas, event: &MapMouseEvent) {
        if !self.pick_mode {
            self.inner.release(canvas, event);
            self.process_inner_events(canvas);
            return;
        }

        self.pick_mode = false;
        let Some(picked) = FeaturePicker::pick(canvas, event.map_pos, GeometryType::Polygon)
        else {
            tracing::debug!("Nothing to pick at {:?}", event.map_pos);
            return;
        };
        if picked.geometry.part_count() != 1 {
            return;
        }
        let Some(geometry) = picked.geometry.first_part() else {
            return;
        };

        let filter = if geometry.is_curved() {
            FilterType::Circle
        } else {
            FilterType::Polygon
        };
        self.set_filter_type(canvas, filter);
        if let Err(e) = self.inner.add_part_from_geometry(canvas, &geometry, &picked.crs) {
            tracing::warn!("Cannot use picked geometry: {}", e);
            self.events.push(ToolEvent::warning(e.to_string()));
        }
        self.process_inner_events(canvas);
    }

    pub fn key(&mut self, canvas: &mut dyn MapCanvas, event: &KeyEvent) {
        self.inner.key(canvas, event);
        self.process_inner_events(canvas);
    }

    // ============== Background Reduction ==============

    /// Collect a finished background reduction; returns true when one completed
    pub fn poll(&mut self, canvas: &mut dyn MapCanvas) -> bool {
        let Some(result) = self.pending.as_mut().and_then(|p| p.task.try_join()) else {
            return false;
        };
        let Some(pending) = self.pending.take() else {
            return false;
        };
        match result {
            Ok(extrema) => {
                if let Err(e) = self.place_pins(canvas, &extrema, &pending.raster_crs) {
                    self.fail(canvas, e);
                }
            }
            Err(RasterError::Cancelled) => {
                tracing::info!("Min/max computation cancelled");
                self.remove_pins(canvas);
            }
            Err(e) => self.fail(canvas, e.into()),
        }
        true
    }

    /// Stop a running background reduction
    pub fn cancel(&mut self) {
        if let Some(pending) = &self.pending {
            pending.task.cancel();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Finished and total tiles of the running background reduction
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.pending.as_ref().map(|p| p.task.progress())
    }

    // ============== Accessors ==============

    pub fn filter_type(&self) -> FilterType {
        self.filter
    }

    pub fn is_picking(&self) -> bool {
        self.pick_mode
    }

    pub fn result(&self) -> Option<&MinMaxResult> {
        self.result.as_ref()
    }

    pub fn pins(&self) -> (Option<&SymbolItem>, Option<&SymbolItem>) {
        (self.pin_min.as_ref(), self.pin_max.as_ref())
    }

    pub fn create_tool(&self) -> &CreateItemTool {
        &self.inner
    }

    /// Drain the notifications emitted since the last call
    pub fn take_events(&mut self) -> Vec<ToolEvent> {
        std::mem::take(&mut self.events)
    }

    // ============== Internals ==============

    /// Forward the inner tool's events and react to finished regions
    fn process_inner_events(&mut self, canvas: &mut dyn MapCanvas) {
        loop {
            let events = self.inner.take_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                let finished = matches!(event, ToolEvent::CreationFinished { .. });
                self.events.push(event);
                if finished {
                    self.draw_finished(canvas);
                }
            }
        }
    }

    fn draw_finished(&mut self, canvas: &mut dyn MapCanvas) {
        if let Err(e) = self.compute(canvas) {
            self.fail(canvas, e);
        }
        self.inner.clear(canvas);
    }

    fn compute(&mut self, canvas: &mut dyn MapCanvas) -> ToolResult<()> {
        let prepared = self.prepare(canvas)?;
        if self.background {
            self.spawn(prepared);
            return Ok(());
        }
        let extrema = self.reduce(&prepared)?;
        self.place_pins(canvas, &extrema, &prepared.raster_crs)
    }

    /// Resolve the heightmap and turn the drawn item into a raster region
    fn prepare(&self, canvas: &dyn MapCanvas) -> ToolResult<Prepared> {
        let reference = self.config.heightmap.clone().ok_or(ToolError::NoHeightmap)?;
        let item = self.inner.item().ok_or(ToolError::NoItem)?;
        let geometry = item.geometry().ok_or(ToolError::NoRegion)?;

        let raster_crs = self.provider.crs(&reference)?;

        let geometry = match self.filter {
            FilterType::Circle => geometry.segmentize(self.config.circle_segment_angle),
            _ => geometry,
        };
        let geometry = geometry.transform(
            canvas.transform(),
            &raster_crs,
            item.crs(),
            TransformDirection::Reverse,
        )?;
        let region = Region::from_geometry(&geometry, self.config.circle_segment_angle)?;

        Ok(Prepared {
            reference,
            region,
            raster_crs,
        })
    }

    fn options(&self) -> ReduceOptions {
        ReduceOptions::default().with_tile_size(self.config.tile_size)
    }

    fn reduce(&self, prepared: &Prepared) -> ToolResult<RasterExtrema> {
        let dataset = self.provider.open(&prepared.reference)?;
        let extrema = reduce_min_max(dataset.as_ref(), &prepared.region, &self.options())?;
        Ok(extrema)
    }

    fn spawn(&mut self, prepared: Prepared) {
        let options = self.options();
        match MinMaxTask::spawn(
            self.provider.clone(),
            prepared.reference,
            prepared.region,
            options,
        ) {
            Ok(task) => {
                tracing::debug!("Min/max computation running in background");
                self.pending = Some(PendingReduction {
                    task,
                    raster_crs: prepared.raster_crs,
                });
            }
            Err(e) => self.events.push(ToolEvent::warning(e.to_string())),
        }
    }

    fn place_pins(
        &mut self,
        canvas: &mut dyn MapCanvas,
        extrema: &RasterExtrema,
        raster_crs: &Crs,
    ) -> ToolResult<()> {
        let canvas_crs = canvas.map_settings().crs.clone();
        let to_canvas = |p: DVec2| {
            canvas
                .transform()
                .transform(p, raster_crs, &canvas_crs, TransformDirection::Forward)
        };
        let min_pos = to_canvas(extrema.min.geo)?;
        let max_pos = to_canvas(extrema.max.geo)?;

        place_pin(canvas, &mut self.pin_min, &canvas_crs, MIN_PIN_ICON, 0.0, min_pos);
        place_pin(canvas, &mut self.pin_max, &canvas_crs, MAX_PIN_ICON, 1.0, max_pos);

        tracing::info!(
            "Min {} at {:?}, max {} at {:?}",
            extrema.min.value,
            min_pos,
            extrema.max.value,
            max_pos
        );
        self.result = Some(MinMaxResult {
            min: extrema.min,
            max: extrema.max,
            min_pos,
            max_pos,
        });
        Ok(())
    }

    fn remove_pins(&mut self, canvas: &mut dyn MapCanvas) {
        for pin in [self.pin_min.take(), self.pin_max.take()].into_iter().flatten() {
            canvas.remove_transient_item(pin.id());
        }
    }

    /// Abort: no markers left behind, one warning for the user
    fn fail(&mut self, canvas: &mut dyn MapCanvas, error: ToolError) {
        tracing::warn!("Min/max computation failed: {}", error);
        self.remove_pins(canvas);
        self.result = None;
        self.events.push(ToolEvent::warning(error.to_string()));
    }
}

/// Create the pin on first use, then move it to `pos`
fn place_pin(
    canvas: &mut dyn MapCanvas,
    pin: &mut Option<SymbolItem>,
    crs: &Crs,
    icon: &str,
    anchor_y: f64,
    pos: DVec2,
) {
    let pin = pin.get_or_insert_with(|| {
        let mut symbol = SymbolItem::new(crs.clone());
        symbol.setup(icon, 0.5, anchor_y);
        symbol.add_part_from_geometry(&Geometry::Point(pos));
        canvas.add_transient_item(symbol.id());
        symbol
    });
    pin.set_position(pos);
}
