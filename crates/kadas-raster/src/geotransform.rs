//! Six-coefficient affine geotransform

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Affine mapping from pixel to geographic coordinates
///
/// `geo.x = c[0] + px * c[1] + py * c[2]`,
/// `geo.y = c[3] + px * c[4] + py * c[5]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform(pub [f64; 6]);

impl Default for GeoTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl GeoTransform {
    /// Pixel coordinates equal geographic coordinates
    pub const IDENTITY: GeoTransform = GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// North-up transform with square pixels, origin at the top-left corner
    pub fn north_up(origin: DVec2, pixel_size: f64) -> Self {
        Self([origin.x, pixel_size, 0.0, origin.y, 0.0, -pixel_size])
    }

    pub fn coefficients(&self) -> &[f64; 6] {
        &self.0
    }

    pub fn pixel_to_geo(&self, px: f64, py: f64) -> DVec2 {
        let c = &self.0;
        DVec2::new(c[0] + px * c[1] + py * c[2], c[3] + px * c[4] + py * c[5])
    }

    pub fn determinant(&self) -> f64 {
        let c = &self.0;
        c[1] * c[5] - c[2] * c[4]
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det != 0.0 && self.0.iter().all(|c| c.is_finite())
    }

    /// Inverse mapping, `None` for singular transforms
    pub fn geo_to_pixel(&self, geo: DVec2) -> Option<DVec2> {
        if !self.is_invertible() {
            return None;
        }
        let c = &self.0;
        let det = self.determinant();
        let dx = geo.x - c[0];
        let dy = geo.y - c[3];
        Some(DVec2::new(
            (dx * c[5] - dy * c[2]) / det,
            (dy * c[1] - dx * c[4]) / det,
        ))
    }
}
