//! Rectangle item: two opposite corners

use glam::DVec2;
use uuid::Uuid;

use super::state::kind_mismatch;
use super::{
    AttribValues, DrawStatus, EditContext, ItemId, ItemState, MapItem, MapSettings,
    NumericAttribute, RectangleState, expect_status, point_from_values, xy_attribs,
};
use crate::crs::Crs;
use crate::geometry::{Geometry, Rect};

const NAME: &str = "Rectangle";

/// An axis-aligned rectangle
#[derive(Debug, Clone)]
pub struct RectangleItem {
    id: ItemId,
    crs: Crs,
    state: RectangleState,
}

impl RectangleItem {
    pub fn new(crs: Crs) -> Self {
        Self {
            id: Uuid::new_v4(),
            crs,
            state: RectangleState::default(),
        }
    }

    /// Normalized rectangle spanned by both corners
    pub fn rect(&self) -> Rect {
        Rect::from_points(&[self.state.p1, self.state.p2])
    }

    /// Corners in drawing order: p1, (p2.x, p1.y), p2, (p1.x, p2.y)
    fn corners(&self) -> [DVec2; 4] {
        let RectangleState { p1, p2, .. } = self.state;
        [p1, DVec2::new(p2.x, p1.y), p2, DVec2::new(p1.x, p2.y)]
    }
}

impl MapItem for RectangleItem {
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
        ItemState::Rectangle(self.state.clone())
    }

    fn restore_state(&mut self, state: &ItemState) {
        match state {
            ItemState::Rectangle(s) => self.state = s.clone(),
            other => kind_mismatch(NAME, other),
        }
    }

    fn reset(&mut self) {
        self.state = RectangleState::default();
    }

    fn start_part(&mut self, first_point: DVec2, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
        self.state = RectangleState {
            draw_status: DrawStatus::Drawing,
            p1: first_point,
            p2: first_point,
        };
        true
    }

    fn start_part_from_attributes(&mut self, values: &[f64], settings: &MapSettings) -> bool {
        self.start_part(point_from_values(values), settings)
    }

    fn set_current_point(&mut self, p: DVec2, _settings: &MapSettings) {
        if expect_status(NAME, self.state.draw_status, DrawStatus::Drawing, "set_current_point") {
            self.state.p2 = p;
        }
    }

    fn set_current_attributes(&mut self, values: &[f64], settings: &MapSettings) {
        self.set_current_point(point_from_values(values), settings);
    }

    fn continue_part(&mut self, _settings: &MapSettings) -> bool {
        // The second corner completes the rectangle
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
        self.rect()
    }

    fn nodes(&self, _settings: &MapSettings) -> Vec<DVec2> {
        if self.state.draw_status == DrawStatus::Empty {
            return Vec::new();
        }
        self.corners().to_vec()
    }

    fn intersects(&self, rect: &Rect, _settings: &MapSettings) -> bool {
        self.state.draw_status != DrawStatus::Empty && self.rect().intersects(rect)
    }

    fn position(&self) -> DVec2 {
        self.rect().center()
    }

    fn set_position(&mut self, pos: DVec2) {
        let delta = pos - self.position();
        self.state.p1 += delta;
        self.state.p2 += delta;
    }

    fn geometry(&self) -> Option<Geometry> {
        (self.state.draw_status != DrawStatus::Empty).then(|| Geometry::Rectangle(self.rect()))
    }

    fn edit(&mut self, context: &EditContext, new_point: DVec2, _settings: &MapSettings) {
        match context.node {
            0 => self.state.p1 = new_point,
            1 => {
                self.state.p2.x = new_point.x;
                self.state.p1.y = new_point.y;
            }
            2 => self.state.p2 = new_point,
            _ => {
                self.state.p1.x = new_point.x;
                self.state.p2.y = new_point.y;
            }
        }
    }

    fn add_part_from_geometry(&mut self, geometry: &Geometry) -> bool {
        let Geometry::Rectangle(rect) = geometry else {
            return false;
        };
        if rect.is_empty() {
            return false;
        }
        self.state = RectangleState {
            draw_status: DrawStatus::Finished,
            p1: DVec2::new(rect.x_min, rect.y_min),
            p2: DVec2::new(rect.x_max, rect.y_max),
        };
        true
    }
}
