//! Picture item: a framed image pinned to a map position

use glam::DVec2;
use uuid::Uuid;

use super::state::kind_mismatch;
use super::{
    AttribValues, DrawStatus, EditContext, ItemId, ItemState, MapItem, MapSettings,
    NumericAttribute, PictureState, expect_status, point_from_values, rotate_about, xy_attribs,
};
use crate::crs::Crs;
use crate::geometry::{Geometry, Rect, path_intersects_rect};

const NAME: &str = "Picture";

/// Default frame offset from the pinned position, in pixels
pub const DEFAULT_PICTURE_OFFSET: DVec2 = DVec2::new(0.0, 50.0);

/// A picture frame shown next to the position it refers to
///
/// The frame is sized in screen pixels and its center sits `offset` pixels
/// away from the pinned position.
#[derive(Debug, Clone)]
pub struct PictureItem {
    id: ItemId,
    crs: Crs,
    file_path: String,
    offset: DVec2,
    state: PictureState,
}

impl PictureItem {
    pub fn new(crs: Crs) -> Self {
        Self {
            id: Uuid::new_v4(),
            crs,
            file_path: String::new(),
            offset: DEFAULT_PICTURE_OFFSET,
            state: PictureState::default(),
        }
    }

    /// Place a picture directly, without interactive drawing
    pub fn setup(
        &mut self,
        path: impl Into<String>,
        pos: DVec2,
        size: DVec2,
        offset_x: f64,
        offset_y: f64,
    ) {
        self.file_path = path.into();
        self.offset = DVec2::new(offset_x, offset_y);
        self.state = PictureState {
            draw_status: DrawStatus::Finished,
            pos,
            angle: 0.0,
            size,
        };
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn offset(&self) -> DVec2 {
        self.offset
    }

    pub fn size(&self) -> DVec2 {
        self.state.size
    }

    pub fn set_angle(&mut self, angle: f64) {
        self.state.angle = angle;
    }

    /// Frame corners in map units: bottom-left, bottom-right, top-right, top-left
    pub fn corner_points(&self, settings: &MapSettings) -> [DVec2; 4] {
        let mupp = settings.map_units_per_pixel;
        let pos = self.state.pos;
        let center = pos + self.offset * mupp;
        let half = self.state.size * mupp * 0.5;
        [
            center - half,
            center + DVec2::new(half.x, -half.y),
            center + half,
            center + DVec2::new(-half.x, half.y),
        ]
        .map(|p| rotate_about(p, pos, self.state.angle))
    }
}

impl MapItem for PictureItem {
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
        ItemState::Picture(self.state.clone())
    }

    fn restore_state(&mut self, state: &ItemState) {
        match state {
            ItemState::Picture(s) => self.state = s.clone(),
            other => kind_mismatch(NAME, other),
        }
    }

    fn reset(&mut self) {
        let size = self.state.size;
        self.state = PictureState {
            size,
            ..Default::default()
        };
    }

    fn start_part(&mut self, first_point: DVec2, _settings: &MapSettings) -> bool {
        if !expect_status(NAME, self.state.draw_status, DrawStatus::Empty, "start_part") {
            return false;
        }
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

    fn nodes(&self, settings: &MapSettings) -> Vec<DVec2> {
        if self.state.draw_status == DrawStatus::Empty {
            return Vec::new();
        }
        self.corner_points(settings).to_vec()
    }

    fn intersects(&self, rect: &Rect, settings: &MapSettings) -> bool {
        if self.state.draw_status == DrawStatus::Empty {
            return false;
        }
        rect.contains(self.state.pos)
            || path_intersects_rect(&self.corner_points(settings), true, rect)
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

    /// Drag a frame corner; the opposite corner and the pinned position stay put
    fn edit(&mut self, context: &EditContext, new_point: DVec2, settings: &MapSettings) {
        let mupp = settings.map_units_per_pixel;
        if mupp <= 0.0 {
            return;
        }
        let pos = self.state.pos;
        // Work in the unrotated frame relative to the pinned position
        let local = rotate_about(new_point, pos, -self.state.angle) - pos;
        let center = self.offset * mupp;
        let half = self.state.size * mupp * 0.5;
        let opposite = match context.node % 4 {
            0 => center + half,
            1 => center + DVec2::new(-half.x, half.y),
            2 => center - half,
            _ => center + DVec2::new(half.x, -half.y),
        };

        self.state.size = (local - opposite).abs() / mupp;
        self.offset = (local + opposite) * 0.5 / mupp;
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
    use approx::assert_relative_eq;

    fn settings() -> MapSettings {
        MapSettings::new(Crs::new("EPSG:2056"), Rect::new(0.0, 0.0, 1000.0, 1000.0), 1.0)
    }

    #[test]
    fn test_single_click_finishes() {
        let s = settings();
        let mut item = PictureItem::new(Crs::new("EPSG:2056"));
        assert!(!item.start_part(DVec2::new(10.0, 20.0), &s));
        assert_eq!(item.draw_status(), DrawStatus::Finished);
        assert_eq!(item.offset(), DEFAULT_PICTURE_OFFSET);
    }

    #[test]
    fn test_setup_and_corners() {
        let s = settings();
        let mut item = PictureItem::new(Crs::new("EPSG:2056"));
        item.setup("photo.jpg", DVec2::new(100.0, 100.0), DVec2::new(40.0, 20.0), 0.0, 50.0);
        assert_eq!(item.draw_status(), DrawStatus::Finished);

        let corners = item.corner_points(&s);
        assert_eq!(corners[0], DVec2::new(80.0, 140.0));
        assert_eq!(corners[2], DVec2::new(120.0, 160.0));
        assert_eq!(item.nodes(&s).len(), 4);

        assert!(item.intersects(&Rect::new(95.0, 145.0, 105.0, 155.0), &s));
        assert!(item.intersects(&Rect::new(99.0, 99.0, 101.0, 101.0), &s));
        assert!(!item.intersects(&Rect::new(95.0, 110.0, 105.0, 120.0), &s));
    }

    #[test]
    fn test_rotated_corners() {
        let s = settings();
        let mut item = PictureItem::new(Crs::new("EPSG:2056"));
        item.setup("photo.jpg", DVec2::ZERO, DVec2::new(20.0, 20.0), 0.0, 50.0);
        item.set_angle(90.0);

        // Frame center swings from (0, 50) to (-50, 0)
        let corners = item.corner_points(&s);
        let center = (corners[0] + corners[2]) * 0.5;
        assert_relative_eq!(center.x, -50.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_edit_corner_resizes_frame() {
        let s = settings();
        let mut item = PictureItem::new(Crs::new("EPSG:2056"));
        item.setup("photo.jpg", DVec2::new(100.0, 100.0), DVec2::new(40.0, 20.0), 0.0, 50.0);

        let ctx = item.edit_context(DVec2::new(121.0, 161.0), &s).unwrap();
        assert_eq!(ctx.node, 2);
        item.edit(&ctx, DVec2::new(140.0, 170.0), &s);

        assert_relative_eq!(item.size().x, 60.0);
        assert_relative_eq!(item.size().y, 30.0);
        assert_eq!(item.position(), DVec2::new(100.0, 100.0));
        assert_eq!(item.corner_points(&s)[0], DVec2::new(80.0, 140.0));
    }

    #[test]
    fn test_attribute_round_trip() {
        let item = PictureItem::new(Crs::new("EPSG:2056"));
        let values = vec![2600123.5, 1199876.25];
        let back = item.draw_attribs_from_position(item.position_from_draw_attribs(&values));
        assert_eq!(back, values);
    }
}
