//! Symbol item: a screen-sized icon placed with a single click

use glam::DVec2;
use uuid::Uuid;

use super::state::kind_mismatch;
use super::{
    AttribValues, DrawStatus, EditContext, ItemId, ItemState, MapItem, MapSettings,
    NumericAttribute, SymbolState, expect_status, point_from_values, rotate_about, xy_attribs,
};
use crate::crs::Crs;
use crate::geometry::{Geometry, Rect, path_intersects_rect};

const NAME: &str = "Symbol";

/// Default icon size in pixels
pub const DEFAULT_SYMBOL_SIZE: f64 = 32.0;

/// An icon anchored at a map position
///
/// The anchor is given as a fraction of the icon size, measured from the
/// top-left corner in screen orientation.
#[derive(Debug, Clone)]
pub struct SymbolItem {
    id: ItemId,
    crs: Crs,
    file_path: String,
    anchor_x: f64,
    anchor_y: f64,
    state: SymbolState,
}

impl SymbolItem {
    pub fn new(crs: Crs) -> Self {
        Self {
            id: Uuid::new_v4(),
            crs,
            file_path: String::new(),
            anchor_x: 0.5,
            anchor_y: 0.5,
            state: Self::empty_state(),
        }
    }

    /// Set the icon file and its anchor
    pub fn setup(&mut self, path: impl Into<String>, anchor_x: f64, anchor_y: f64) {
        self.file_path = path.into();
        self.anchor_x = anchor_x;
        self.anchor_y = anchor_y;
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn anchor(&self) -> (f64, f64) {
        (self.anchor_x, self.anchor_y)
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.state.angle = angle;
    }

    pub fn set_size(&mut self, size: DVec2) {
        self.state.size = size;
    }

    /// Icon frame corners in map units, rotated around the anchor
    pub fn corner_points(&self, settings: &MapSettings) -> [DVec2; 4] {
        let size = self.state.size * settings.map_units_per_pixel;
        let pos = self.state.pos;
        let x_min = pos.x - self.anchor_x * size.x;
        let y_max = pos.y + self.anchor_y * size.y;
        let x_max = x_min + size.x;
        let y_min = y_max - size.y;
        [
            DVec2::new(x_min, y_min),
            DVec2::new(x_max, y_min),
            DVec2::new(x_max, y_max),
            DVec2::new(x_min, y_max),
        ]
        .map(|p| rotate_about(p, pos, self.state.angle))
    }

    fn empty_state() -> SymbolState {
        SymbolState {
            size: DVec2::splat(DEFAULT_SYMBOL_SIZE),
            ..Default::default()
        }
    }
}

impl MapItem for SymbolItem {
    fn id(&self) -> ItemId {
        self.id
    }

    fn item_name(&self) -> &'static str {
        NAME
    }

    fn crs(&self) -> &Crs {
        &self.crs
    }

    fn draw_status(&self) -> DrawStatus {
        self.state.draw_status
    }

    fn state(&self) -> ItemState {
        ItemState::Symbol(self.state.clone())
    }

    fn restore_state(&mut self, state: &ItemState) {
        match state {
            ItemState::Symbol(s) => self.state = s.clone(),
            other => kind_mismatch(NAME, other),
        }
    }

    fn reset(&mut self) {
        let size = self.state.size;
        self.state = SymbolState {
            size,
            ..Self::empty_state()
        };
    }

    fn start_part(&mut self, first_point: DVec2, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
        // Placed with one click
        self.state.pos = first_point;
        self.state.draw_status = DrawStatus::Finished;
        false
    }

    fn start_part_from_attributes(&mut self, values: &[f64], settings: &MapSettings) -> bool {
        self.start_part(point_from_values(values), settings)
    }

    fn set_current_point(&mut self, p: DVec2, _settings: &MapSettings) {
        self.state.pos = p;
    }

    fn set_current_attributes(&mut self, values: &[f64], _settings: &MapSettings) {
        self.state.pos = point_from_values(values);
    }

    fn continue_part(&mut self, _settings: &MapSettings) -> bool {
        false
    }

    fn end_part(&mut self) {
        self.state.draw_status = DrawStatus::Finished;
    }

    fn draw_attribs(&self) -> Vec<NumericAttribute> {
        xy_attribs()
    }

    fn draw_attribs_from_position(&self, pos: DVec2) -> AttribValues {
        vec![pos.x, pos.y]
    }

    fn position_from_draw_attribs(&self, values: &[f64]) -> DVec2 {
        point_from_values(values)
    }

    fn bounding_box(&self) -> Rect {
        if self.state.draw_status == DrawStatus::Empty {
            return Rect::empty();
        }
        Rect::from_point(self.state.pos)
    }

    fn nodes(&self, _settings: &MapSettings) -> Vec<DVec2> {
        if self.state.draw_status == DrawStatus::Empty {
            return Vec::new();
        }
        vec![self.state.pos]
    }

    fn intersects(&self, rect: &Rect, settings: &MapSettings) -> bool {
        self.state.draw_status != DrawStatus::Empty
            && path_intersects_rect(&self.corner_points(settings), true, rect)
    }

    fn position(&self) -> DVec2 {
        self.state.pos
    }

    fn set_position(&mut self, pos: DVec2) {
        self.state.pos = pos;
    }

    fn geometry(&self) -> Option<Geometry> {
        (self.state.draw_status != DrawStatus::Empty).then(|| Geometry::Point(self.state.pos))
    }

    fn edit(&mut self, _context: &EditContext, new_point: DVec2, _settings: &MapSettings) {
        self.state.pos = new_point;
    }

    fn add_part_from_geometry(&mut self, geometry: &Geometry) -> bool {
        let Geometry::Point(p) = geometry else {
            return false;
        };
        self.state.pos = *p;
        self.state.draw_status = DrawStatus::Finished;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(mupp: f64) -> MapSettings {
        MapSettings::new(Crs::new("EPSG:2056"), Rect::new(0.0, 0.0, 1000.0, 1000.0), mupp)
    }

    #[test]
    fn test_single_click_finishes() {
        let s = settings(1.0);
        let mut item = SymbolItem::new(Crs::new("EPSG:2056"));
        item.setup("pins/flag.svg", 0.5, 1.0);

        assert!(!item.start_part(DVec2::new(100.0, 200.0), &s));
        assert_eq!(item.draw_status(), DrawStatus::Finished);
        assert_eq!(item.geometry(), Some(Geometry::Point(DVec2::new(100.0, 200.0))));
        assert_eq!(item.file_path(), "pins/flag.svg");
    }

    #[test]
    fn test_attribute_round_trip() {
        let item = SymbolItem::new(Crs::new("EPSG:2056"));
        for values in [vec![0.0, 0.0], vec![2683000.0, 1247000.5]] {
            let back = item.draw_attribs_from_position(item.position_from_draw_attribs(&values));
            assert_eq!(back, values);
        }
    }

    #[test]
    fn test_frame_scales_with_map_units() {
        let mut item = SymbolItem::new(Crs::new("EPSG:2056"));
        // Anchor at the bottom center, like a pin
        item.setup("pin.svg", 0.5, 1.0);
        item.add_part_from_geometry(&Geometry::Point(DVec2::new(100.0, 100.0)));

        let corners = item.corner_points(&settings(2.0));
        assert_eq!(corners[0], DVec2::new(68.0, 100.0));
        assert_eq!(corners[2], DVec2::new(132.0, 164.0));

        // Frame extends 64 map units above the anchor
        assert!(item.intersects(&Rect::new(95.0, 140.0, 105.0, 145.0), &settings(2.0)));
        assert!(!item.intersects(&Rect::new(95.0, 140.0, 105.0, 145.0), &settings(1.0)));
        assert!(!item.intersects(&Rect::new(95.0, 80.0, 105.0, 90.0), &settings(2.0)));
    }

    #[test]
    fn test_reset_keeps_size() {
        let s = settings(1.0);
        let mut item = SymbolItem::new(Crs::new("EPSG:2056"));
        item.set_size(DVec2::new(48.0, 24.0));
        item.start_part(DVec2::ONE, &s);
        item.reset();
        assert_eq!(item.draw_status(), DrawStatus::Empty);
        assert_eq!(
            item.state(),
            ItemState::Symbol(SymbolState {
                size: DVec2::new(48.0, 24.0),
                ..Default::default()
            })
        );
    }
}
