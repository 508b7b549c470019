//! Reduction regions: a bounding box plus an optional polygon mask

use glam::DVec2;
use kadas_core::{Geometry, Rect, contains_point_winding};

use crate::error::{RasterError, RasterResult};

/// Area of a raster to reduce, in raster coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    bbox: Rect,
    /// Outer ring; `None` for axis-aligned rectangles where the box is exact
    mask: Option<Vec<DVec2>>,
}

impl Region {
    /// Axis-aligned rectangular region, no masking needed
    pub fn rectangle(bbox: Rect) -> Self {
        Self { bbox, mask: None }
    }

    /// Region bounded by a polygon ring
    pub fn polygon(ring: Vec<DVec2>) -> Self {
        Self {
            bbox: Rect::from_points(&ring),
            mask: Some(ring),
        }
    }

    /// Build a region from an areal geometry
    ///
    /// Circles are approximated by a polygon with one vertex every
    /// `segment_angle` radians; multi-polygons use their first part.
    pub fn from_geometry(geometry: &Geometry, segment_angle: f64) -> RasterResult<Self> {
        match geometry {
            Geometry::Rectangle(rect) => Ok(Self::rectangle(*rect)),
            Geometry::Circle { .. } => match geometry.segmentize(segment_angle) {
                Geometry::Polygon(ring) => Ok(Self::polygon(ring)),
                other => Err(RasterError::UnsupportedRegion(format!("{other:?}"))),
            },
            Geometry::Polygon(ring) if ring.len() >= 3 => Ok(Self::polygon(ring.clone())),
            Geometry::MultiPolygon(parts) => match parts.first() {
                Some(ring) if ring.len() >= 3 => Ok(Self::polygon(ring.clone())),
                _ => Err(RasterError::UnsupportedRegion("empty multi-polygon".into())),
            },
            Geometry::Polygon(_) => {
                Err(RasterError::UnsupportedRegion("degenerate polygon".into()))
            }
            Geometry::Point(_) => Err(RasterError::UnsupportedRegion("point".into())),
            Geometry::LineString(_) => Err(RasterError::UnsupportedRegion("line".into())),
        }
    }

    pub fn bbox(&self) -> &Rect {
        &self.bbox
    }

    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Whether a point participates (nonzero winding rule)
    pub fn contains(&self, p: DVec2) -> bool {
        match &self.mask {
            Some(ring) => contains_point_winding(ring, p),
            None => true,
        }
    }
}
