//! Polygon item: one vertex per click, the last vertex follows the pointer

use glam::DVec2;
use uuid::Uuid;

use super::state::kind_mismatch;
use super::{
    AttribValues, DrawStatus, EditContext, ItemId, ItemState, MapItem, MapSettings,
    NumericAttribute, PolygonState, expect_status, point_from_values, xy_attribs,
};
use crate::crs::Crs;
use crate::geometry::{Geometry, Rect, path_intersects_rect};

const NAME: &str = "Polygon";

/// A simple polygon ring
#[derive(Debug, Clone)]
pub struct PolygonItem {
    id: ItemId,
    crs: Crs,
    state: PolygonState,
}

impl PolygonItem {
    pub fn new(crs: Crs) -> Self {
        Self {
            id: Uuid::new_v4(),
            crs,
            state: PolygonState::default(),
        }
    }

    /// Vertices, including the floating one while drawing
    pub fn points(&self) -> &[DVec2] {
        &self.state.points
    }
}

impl MapItem for PolygonItem {
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
        ItemState::Polygon(self.state.clone())
    }

    fn restore_state(&mut self, state: &ItemState) {
        match state {
            ItemState::Polygon(s) => self.state = s.clone(),
            other => kind_mismatch(NAME, other),
        }
    }

    fn reset(&mut self) {
        self.state = PolygonState::default();
    }

    fn start_part(&mut self, first_point: DVec2, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
        // Committed first vertex plus the floating one
        self.state = PolygonState {
            draw_status: DrawStatus::Drawing,
            points: vec![first_point, first_point],
        };
        true
    }

    fn start_part_from_attributes(&mut self, values: &[f64], settings: &MapSettings) -> bool {
        self.start_part(point_from_values(values), settings)
    }

    fn set_current_point(&mut self, p: DVec2, _settings: &MapSettings) {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Drawing, "set_current_point") {
            return;
        }
        if let Some(last) = self.state.points.last_mut() {
            *last = p;
        }
    }

    fn set_current_attributes(&mut self, values: &[f64], settings: &MapSettings) {
        self.set_current_point(point_from_values(values), settings);
    }

    fn continue_part(&mut self, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Drawing, "continue_part") {
            return false;
        }
        if let Some(&last) = self.state.points.last() {
            self.state.points.push(last);
        }
        true
    }

    fn end_part(&mut self) {
        self.state.points.dedup();
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
        Rect::from_points(&self.state.points)
    }

    fn nodes(&self, _settings: &MapSettings) -> Vec<DVec2> {
        self.state.points.clone()
    }

    fn intersects(&self, rect: &Rect, _settings: &MapSettings) -> bool {
        path_intersects_rect(&self.state.points, true, rect)
    }

    fn position(&self) -> DVec2 {
        let bbox = self.bounding_box();
        if bbox.is_empty() {
            DVec2::ZERO
        } else {
            bbox.center()
        }
    }

    fn set_position(&mut self, pos: DVec2) {
        let delta = pos - self.position();
        for p in &mut self.state.points {
            *p += delta;
        }
    }

    fn geometry(&self) -> Option<Geometry> {
        (!self.state.points.is_empty()).then(|| Geometry::Polygon(self.state.points.clone()))
    }

    fn edit(&mut self, context: &EditContext, new_point: DVec2, _settings: &MapSettings) {
        if let Some(p) = self.state.points.get_mut(context.node) {
            *p = new_point;
        }
    }

    fn add_part_from_geometry(&mut self, geometry: &Geometry) -> bool {
        let ring = match geometry {
            Geometry::Polygon(_) | Geometry::Rectangle(_) | Geometry::MultiPolygon(_) => {
                geometry.to_ring()
            }
            _ => None,
        };
        let Some(ring) = ring.filter(|r| r.len() >= 3) else {
            return false;
        };
        self.state = PolygonState {
            draw_status: DrawStatus::Finished,
            points: ring,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MapSettings {
        MapSettings::new(Crs::new("EPSG:2056"), Rect::new(0.0, 0.0, 100.0, 100.0), 1.0)
    }

    fn square() -> PolygonItem {
        let mut item = PolygonItem::new(Crs::new("EPSG:2056"));
        item.add_part_from_geometry(&Geometry::Rectangle(Rect::new(0.0, 0.0, 10.0, 10.0)));
        item
    }

    #[test]
    fn test_draw_polygon() {
        let s = settings();
        let mut item = PolygonItem::new(Crs::new("EPSG:2056"));
        assert!(item.start_part(DVec2::new(0.0, 0.0), &s));
        assert!(item.set_next_point(DVec2::new(10.0, 0.0), &s));
        item.set_current_point(DVec2::new(8.0, 6.0), &s);
        assert_eq!(item.points().len(), 3);

        assert!(item.set_next_point(DVec2::new(10.0, 10.0), &s));
        assert_eq!(item.points().len(), 4);
        item.end_part();

        // The floating duplicate collapses on finish
        assert_eq!(
            item.points(),
            &[
                DVec2::new(0.0, 0.0),
                DVec2::new(10.0, 0.0),
                DVec2::new(10.0, 10.0)
            ]
        );
        assert_eq!(item.draw_status(), DrawStatus::Finished);
    }

    #[test]
    fn test_attribute_round_trip() {
        let s = settings();
        let mut item = PolygonItem::new(Crs::new("EPSG:2056"));
        item.start_part(DVec2::ZERO, &s);
        for values in [vec![1.0, 2.0], vec![-700.125, 0.5]] {
            let back = item.draw_attribs_from_position(item.position_from_draw_attribs(&values));
            assert_eq!(back, values);
        }
    }

    #[test]
    fn test_intersects() {
        let s = settings();
        let item = square();
        // Fully inside the ring
        assert!(item.intersects(&Rect::new(4.0, 4.0, 6.0, 6.0), &s));
        // Crossing an edge
        assert!(item.intersects(&Rect::new(8.0, -2.0, 12.0, 2.0), &s));
        assert!(!item.intersects(&Rect::new(20.0, 20.0, 30.0, 30.0), &s));
    }

    #[test]
    fn test_add_part_from_multipolygon_uses_first_part() {
        let mut item = PolygonItem::new(Crs::new("EPSG:2056"));
        let first = vec![DVec2::ZERO, DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)];
        let second = vec![DVec2::splat(5.0), DVec2::new(6.0, 5.0), DVec2::new(5.0, 6.0)];
        assert!(item.add_part_from_geometry(&Geometry::MultiPolygon(vec![first.clone(), second])));
        assert_eq!(item.points(), first.as_slice());

        let mut other = PolygonItem::new(Crs::new("EPSG:2056"));
        assert!(!other.add_part_from_geometry(&Geometry::Point(DVec2::ZERO)));
        assert_eq!(other.draw_status(), DrawStatus::Empty);
    }

    #[test]
    fn test_edit_vertex() {
        let s = settings();
        let mut item = square();
        let ctx = item.edit_context(DVec2::new(9.0, 9.5), &s).unwrap();
        assert_eq!(ctx.node, 2);
        item.edit(&ctx, DVec2::new(15.0, 15.0), &s);
        assert_eq!(item.points()[2], DVec2::new(15.0, 15.0));
    }

    #[test]
    fn test_undo_snapshot_restores_vertices() {
        let s = settings();
        let mut item = PolygonItem::new(Crs::new("EPSG:2056"));
        item.start_part(DVec2::ZERO, &s);
        item.set_next_point(DVec2::new(5.0, 0.0), &s);
        let snapshot = item.state();
        item.set_next_point(DVec2::new(5.0, 5.0), &s);

        item.restore_state(&snapshot);
        assert_eq!(item.points().len(), 3);
    }
}
