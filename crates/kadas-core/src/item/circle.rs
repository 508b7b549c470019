//! Circle item: center click, then radius click

use glam::DVec2;
use uuid::Uuid;

use super::state::kind_mismatch;
use super::{
    AttribValues, CircleState, DrawStatus, EditContext, ItemId, ItemState, MapItem, MapSettings,
    NumericAttribute, expect_status, point_from_values,
};
use crate::crs::Crs;
use crate::geometry::{Geometry, Rect};

const NAME: &str = "Circle";

/// A circle drawn from its center outward
#[derive(Debug, Clone)]
pub struct CircleItem {
    id: ItemId,
    crs: Crs,
    state: CircleState,
}

impl CircleItem {
    pub fn new(crs: Crs) -> Self {
        Self {
            id: Uuid::new_v4(),
            crs,
            state: CircleState::default(),
        }
    }

    pub fn center(&self) -> DVec2 {
        self.state.center
    }

    pub fn radius(&self) -> f64 {
        self.state.radius
    }
}

impl MapItem for CircleItem {
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
        ItemState::Circle(self.state.clone())
    }

    fn restore_state(&mut self, state: &ItemState) {
        match state {
            ItemState::Circle(s) => self.state = s.clone(),
            other => kind_mismatch(NAME, other),
        }
    }

    fn reset(&mut self) {
        self.state = CircleState::default();
    }

    fn start_part(&mut self, first_point: DVec2, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
        self.state = CircleState {
            draw_status: DrawStatus::Drawing,
            center: first_point,
            radius: 0.0,
        };
        true
    }

    fn start_part_from_attributes(&mut self, values: &[f64], _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
        self.state = CircleState {
            draw_status: DrawStatus::Drawing,
            center: point_from_values(values),
            radius: values.get(2).copied().unwrap_or_default().abs(),
        };
        true
    }

    fn set_current_point(&mut self, p: DVec2, _settings: &MapSettings) {
        if expect_status(NAME, self.state.draw_status, DrawStatus::Drawing, "set_current_point") {
            self.state.radius = self.state.center.distance(p);
        }
    }

    fn set_current_attributes(&mut self, values: &[f64], _settings: &MapSettings) {
        if expect_status(
            NAME,
            self.state.draw_status,
            DrawStatus::Drawing,
            "set_current_attributes",
        ) {
            self.state.center = point_from_values(values);
            self.state.radius = values.get(2).copied().unwrap_or_default().abs();
        }
    }

    fn continue_part(&mut self, _settings: &MapSettings) -> bool {
        // Center and radius fully define the circle
        false
    }

    fn end_part(&mut self) {
        self.state.draw_status = DrawStatus::Finished;
    }

    fn draw_attribs(&self) -> Vec<NumericAttribute> {
        vec![
            NumericAttribute::new("x", 0),
            NumericAttribute::new("y", 0),
            NumericAttribute::new("r", 0),
        ]
    }

    fn draw_attribs_from_position(&self, pos: DVec2) -> AttribValues {
        if self.state.draw_status == DrawStatus::Drawing {
            let c = self.state.center;
            vec![c.x, c.y, c.distance(pos)]
        } else {
            vec![pos.x, pos.y, 0.0]
        }
    }

    fn position_from_draw_attribs(&self, values: &[f64]) -> DVec2 {
        let center = point_from_values(values);
        if self.state.draw_status == DrawStatus::Drawing {
            center + DVec2::new(values.get(2).copied().unwrap_or_default(), 0.0)
        } else {
            center
        }
    }

    fn bounding_box(&self) -> Rect {
        if self.state.draw_status == DrawStatus::Empty {
            return Rect::empty();
        }
        Rect::from_point(self.state.center).buffered(self.state.radius)
    }

    fn nodes(&self, _settings: &MapSettings) -> Vec<DVec2> {
        if self.state.draw_status == DrawStatus::Empty {
            return Vec::new();
        }
        vec![
            self.state.center,
            self.state.center + DVec2::new(self.state.radius, 0.0),
        ]
    }

    fn intersects(&self, rect: &Rect, _settings: &MapSettings) -> bool {
        if self.state.draw_status == DrawStatus::Empty || rect.is_empty() {
            return false;
        }
        // Closest point of the rectangle to the center
        let c = self.state.center;
        let nearest = DVec2::new(
            c.x.clamp(rect.x_min, rect.x_max),
            c.y.clamp(rect.y_min, rect.y_max),
        );
        nearest.distance(c) <= self.state.radius
    }

    fn position(&self) -> DVec2 {
        self.state.center
    }

    fn set_position(&mut self, pos: DVec2) {
        self.state.center = pos;
    }

    fn geometry(&self) -> Option<Geometry> {
        (self.state.draw_status != DrawStatus::Empty).then(|| Geometry::Circle {
            center: self.state.center,
            radius: self.state.radius,
        })
    }

    fn edit(&mut self, context: &EditContext, new_point: DVec2, _settings: &MapSettings) {
        match context.node {
            0 => self.state.center = new_point,
            _ => self.state.radius = self.state.center.distance(new_point),
        }
    }

    fn add_part_from_geometry(&mut self, geometry: &Geometry) -> bool {
        let Geometry::Circle { center, radius } = geometry else {
            return false;
        };
        self.state = CircleState {
            draw_status: DrawStatus::Finished,
            center: *center,
            radius: radius.abs(),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn settings() -> MapSettings {
        MapSettings::new(Crs::new("EPSG:2056"), Rect::new(0.0, 0.0, 100.0, 100.0), 1.0)
    }

    #[test]
    fn test_draw_circle() {
        let s = settings();
        let mut item = CircleItem::new(Crs::new("EPSG:2056"));
        assert_eq!(item.draw_status(), DrawStatus::Empty);
        assert!(item.geometry().is_none());

        assert!(item.start_part(DVec2::new(10.0, 10.0), &s));
        assert_eq!(item.draw_status(), DrawStatus::Drawing);

        item.set_current_point(DVec2::new(13.0, 14.0), &s);
        assert_relative_eq!(item.radius(), 5.0);

        // The second click completes the shape
        assert!(!item.set_next_point(DVec2::new(16.0, 18.0), &s));
        item.end_part();
        assert_eq!(item.draw_status(), DrawStatus::Finished);
        assert_relative_eq!(item.radius(), 10.0);
        assert_eq!(item.bounding_box(), Rect::new(0.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_attribute_round_trip_while_drawing() {
        let s = settings();
        let mut item = CircleItem::new(Crs::new("EPSG:2056"));
        item.start_part(DVec2::new(-4.5, 7.25), &s);

        for r in [0.0, 0.5, 3.0, 1234.5678] {
            let values = vec![-4.5, 7.25, r];
            let pos = item.position_from_draw_attribs(&values);
            let back = item.draw_attribs_from_position(pos);
            for (a, b) in values.iter().zip(&back) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_attribute_round_trip_when_empty() {
        let item = CircleItem::new(Crs::new("EPSG:2056"));
        let values = vec![600000.25, 200000.75, 0.0];
        let back = item.draw_attribs_from_position(item.position_from_draw_attribs(&values));
        assert_eq!(back, values);
    }

    #[test]
    fn test_start_from_attributes() {
        let s = settings();
        let mut item = CircleItem::new(Crs::new("EPSG:2056"));
        assert!(item.start_part_from_attributes(&[1.0, 2.0, 3.0], &s));
        assert_eq!(item.center(), DVec2::new(1.0, 2.0));
        assert_relative_eq!(item.radius(), 3.0);
        assert!(!item.accept_attribute_values(&s));
    }

    #[test]
    fn test_restore_state() {
        let s = settings();
        let mut item = CircleItem::new(Crs::new("EPSG:2056"));
        item.start_part(DVec2::ZERO, &s);
        let snapshot = item.state();
        item.set_current_point(DVec2::new(8.0, 0.0), &s);
        assert_relative_eq!(item.radius(), 8.0);

        item.restore_state(&snapshot);
        assert_relative_eq!(item.radius(), 0.0);
        assert_eq!(item.draw_status(), DrawStatus::Drawing);
    }

    #[test]
    fn test_intersects_and_edit() {
        let s = settings();
        let mut item = CircleItem::new(Crs::new("EPSG:2056"));
        item.add_part_from_geometry(&Geometry::Circle {
            center: DVec2::new(50.0, 50.0),
            radius: 10.0,
        });
        assert!(item.intersects(&Rect::new(55.0, 55.0, 70.0, 70.0), &s));
        // Corner region outside the circle although the bounding boxes overlap
        assert!(!item.intersects(&Rect::new(58.0, 58.0, 70.0, 70.0), &s));

        let ctx = item.edit_context(DVec2::new(60.0, 51.0), &s).unwrap();
        assert_eq!(ctx.node, 1);
        item.edit(&ctx, DVec2::new(70.0, 50.0), &s);
        assert_relative_eq!(item.radius(), 20.0);
    }
}
