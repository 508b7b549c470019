//! Pixel windows and their tiling

use kadas_core::Rect;
use serde::{Deserialize, Serialize};

use crate::geotransform::GeoTransform;

/// Inclusive pixel bounds within a raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RasterWindow {
    pub col_start: usize,
    pub row_start: usize,
    pub col_end: usize,
    pub row_end: usize,
}

/// A block of pixels read in one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Scan-order index of the tile within its window
    pub index: usize,
    pub col: usize,
    pub row: usize,
    pub width: usize,
    pub height: usize,
}

impl RasterWindow {
    /// Pixel window covering `bbox`, clipped to a `width` x `height` raster
    ///
    /// Returns `None` when the box lies entirely outside the raster, when the
    /// raster is empty or when the geotransform cannot be inverted.
    pub fn compute(bbox: &Rect, gt: &GeoTransform, width: usize, height: usize) -> Option<Self> {
        if bbox.is_empty() || width == 0 || height == 0 {
            return None;
        }

        // Rotated transforms need all four corners
        let mut col_min = f64::INFINITY;
        let mut col_max = f64::NEG_INFINITY;
        let mut row_min = f64::INFINITY;
        let mut row_max = f64::NEG_INFINITY;
        for corner in bbox.corners() {
            let px = gt.geo_to_pixel(corner)?;
            col_min = col_min.min(px.x.floor());
            col_max = col_max.max(px.x.floor());
            row_min = row_min.min(px.y.floor());
            row_max = row_max.max(px.y.floor());
        }

        if col_max < 0.0 || row_max < 0.0 || col_min >= width as f64 || row_min >= height as f64 {
            return None;
        }

        let clamp = |v: f64, len: usize| v.clamp(0.0, (len - 1) as f64) as usize;
        Some(Self {
            col_start: clamp(col_min, width),
            row_start: clamp(row_min, height),
            col_end: clamp(col_max, width),
            row_end: clamp(row_max, height),
        })
    }

    pub fn width(&self) -> usize {
        self.col_end - self.col_start + 1
    }

    pub fn height(&self) -> usize {
        self.row_end - self.row_start + 1
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Square tiles of side `tile_size` in row-major scan order
    ///
    /// Tiles on the right and bottom edges are cut to the window.
    pub fn tiles(&self, tile_size: usize) -> Vec<Tile> {
        let size = tile_size.max(1);
        let mut tiles = Vec::new();
        for row in (self.row_start..=self.row_end).step_by(size) {
            for col in (self.col_start..=self.col_end).step_by(size) {
                tiles.push(Tile {
                    index: tiles.len(),
                    col,
                    row,
                    width: size.min(self.col_end + 1 - col),
                    height: size.min(self.row_end + 1 - row),
                });
            }
        }
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_compute_identity() {
        let window = RasterWindow::compute(
            &Rect::new(100.0, 100.0, 200.0, 200.0),
            &GeoTransform::IDENTITY,
            512,
            512,
        )
        .unwrap();
        assert_eq!((window.col_start, window.row_start), (100, 100));
        assert_eq!((window.col_end, window.row_end), (200, 200));
        assert_eq!(window.width(), 101);
    }

    #[test]
    fn test_compute_clamps_to_raster() {
        let window = RasterWindow::compute(
            &Rect::new(-50.5, 400.0, 30.2, 900.0),
            &GeoTransform::IDENTITY,
            512,
            512,
        )
        .unwrap();
        assert_eq!(window.col_start, 0);
        assert_eq!(window.col_end, 30);
        assert_eq!(window.row_start, 400);
        assert_eq!(window.row_end, 511);
    }

    #[test]
    fn test_compute_north_up() {
        // 10 m pixels, raster spans x 1000..2000, y 4000..5000
        let gt = GeoTransform::north_up(DVec2::new(1000.0, 5000.0), 10.0);
        let window =
            RasterWindow::compute(&Rect::new(1205.0, 4800.0, 1300.0, 4905.0), &gt, 100, 100)
                .unwrap();
        assert_eq!((window.col_start, window.col_end), (20, 30));
        assert_eq!((window.row_start, window.row_end), (9, 20));
    }

    #[test]
    fn test_compute_outside() {
        let gt = GeoTransform::IDENTITY;
        let outside = |bbox: Rect| RasterWindow::compute(&bbox, &gt, 512, 512).is_none();
        assert!(outside(Rect::new(600.0, 0.0, 700.0, 10.0)));
        assert!(outside(Rect::new(-20.0, -20.0, -1.0, -1.0)));
        assert!(outside(Rect::empty()));
        assert!(
            RasterWindow::compute(&Rect::new(0.0, 0.0, 1.0, 1.0), &GeoTransform([0.0; 6]), 4, 4)
                .is_none()
        );
    }

    #[test]
    fn test_tiles_row_major() {
        let window = RasterWindow {
            col_start: 10,
            row_start: 0,
            col_end: 609,
            row_end: 299,
        };
        let tiles = window.tiles(256);
        assert_eq!(tiles.len(), 6);
        assert_eq!((tiles[1].col, tiles[1].row), (266, 0));
        assert_eq!((tiles[3].col, tiles[3].row), (10, 256));
        assert_eq!(tiles[2].width, 600 - 512);
        assert_eq!(tiles[5].height, 300 - 256);
        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));

        let covered: usize = tiles.iter().map(|t| t.width * t.height).sum();
        assert_eq!(covered, window.pixel_count());
    }
}
