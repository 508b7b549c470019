//! Tiled min/max reduction over a raster region
//!
//! The window covering the region is split into square tiles. Tiles are
//! reduced in parallel, each producing its local extrema; the local results
//! are then merged sequentially in scan order with strict comparisons, so
//! ties always resolve to the first pixel in tile-scan order no matter
//! which worker finished first.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use glam::DVec2;
use rayon::prelude::*;

use crate::error::{RasterError, RasterResult};
use crate::geotransform::GeoTransform;
use crate::region::Region;
use crate::source::{RasterDataset, RasterProvider};
use crate::window::{RasterWindow, Tile};

/// Default side length of a tile in pixels
pub const DEFAULT_TILE_SIZE: usize = 256;

/// Progress callback, called with (finished tiles, total tiles)
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Shared flag to stop a running reduction
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Reduction parameters
#[derive(Clone)]
pub struct ReduceOptions {
    pub tile_size: usize,
    /// 0-based band index
    pub band: usize,
    pub cancel: CancelToken,
    pub progress: Option<ProgressFn>,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            band: 0,
            cancel: CancelToken::default(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for ReduceOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReduceOptions")
            .field("tile_size", &self.tile_size)
            .field("band", &self.band)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl ReduceOptions {
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_progress(
        mut self,
        progress: impl Fn(usize, usize) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A located extreme sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    pub value: f64,
    /// Pixel column in the raster
    pub col: usize,
    /// Pixel row in the raster
    pub row: usize,
    /// Geographic position of the pixel origin, in raster CRS
    pub geo: DVec2,
}

/// Result of a min/max reduction
#[derive(Debug, Clone, PartialEq)]
pub struct RasterExtrema {
    pub min: Extremum,
    pub max: Extremum,
    pub window: RasterWindow,
    /// Number of samples that took part
    pub samples: usize,
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    value: f64,
    col: usize,
    row: usize,
}

/// Local extrema of one tile
#[derive(Debug, Default)]
struct TileExtrema {
    min: Option<Sample>,
    max: Option<Sample>,
    samples: usize,
}

impl TileExtrema {
    fn offer(&mut self, sample: Sample) {
        self.samples += 1;
        if self.min.is_none_or(|m| sample.value < m.value) {
            self.min = Some(sample);
        }
        if self.max.is_none_or(|m| sample.value > m.value) {
            self.max = Some(sample);
        }
    }

    /// Merge a later tile; equal values keep the earlier location
    fn merge(mut self, later: TileExtrema) -> Self {
        if let Some(min) = later.min
            && self.min.is_none_or(|m| min.value < m.value)
        {
            self.min = Some(min);
        }
        if let Some(max) = later.max
            && self.max.is_none_or(|m| max.value > m.value)
        {
            self.max = Some(max);
        }
        self.samples += later.samples;
        self
    }
}

/// Find the minimum and maximum sample of `dataset` inside `region`
///
/// The region must be given in the raster's CRS.
pub fn reduce_min_max(
    dataset: &dyn RasterDataset,
    region: &Region,
    options: &ReduceOptions,
) -> RasterResult<RasterExtrema> {
    let band_count = dataset.band_count();
    if band_count == 0 {
        return Err(RasterError::NoBands);
    }
    if options.band >= band_count {
        return Err(RasterError::BandOutOfRange {
            band: options.band,
            count: band_count,
        });
    }
    let gt = dataset
        .geo_transform()
        .filter(GeoTransform::is_invertible)
        .ok_or(RasterError::InvalidGeoTransform)?;

    let window = RasterWindow::compute(region.bbox(), &gt, dataset.width(), dataset.height())
        .ok_or(RasterError::EmptyWindow)?;
    let tiles = window.tiles(options.tile_size);
    tracing::debug!(
        "Reducing window {:?} in {} tiles of {} px",
        window,
        tiles.len(),
        options.tile_size
    );

    let total = tiles.len();
    let done = AtomicUsize::new(0);
    let locals = tiles
        .par_iter()
        .map(|tile| {
            if options.cancel.is_cancelled() {
                return Err(RasterError::Cancelled);
            }
            let local = reduce_tile(dataset, &gt, region, tile, options.band)?;
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(progress) = &options.progress {
                progress(finished, total);
            }
            Ok(local)
        })
        .collect::<RasterResult<Vec<_>>>()?;

    // Sequential merge in scan order
    let global = locals
        .into_iter()
        .fold(TileExtrema::default(), TileExtrema::merge);

    let (Some(min), Some(max)) = (global.min, global.max) else {
        return Err(RasterError::EmptySelection);
    };
    let locate = |s: Sample| Extremum {
        value: s.value,
        col: s.col,
        row: s.row,
        geo: gt.pixel_to_geo(s.col as f64, s.row as f64),
    };

    let result = RasterExtrema {
        min: locate(min),
        max: locate(max),
        window,
        samples: global.samples,
    };
    tracing::info!(
        "Min {} at {:?}, max {} at {:?} ({} samples)",
        result.min.value,
        result.min.geo,
        result.max.value,
        result.max.geo,
        result.samples
    );
    Ok(result)
}

/// Open `reference`, reduce it and release the dataset again
///
/// The dataset handle is dropped before returning on every path.
pub fn reduce_reference(
    provider: &dyn RasterProvider,
    reference: &str,
    region: &Region,
    options: &ReduceOptions,
) -> RasterResult<RasterExtrema> {
    let dataset = provider.open(reference)?;
    reduce_min_max(dataset.as_ref(), region, options)
}

fn reduce_tile(
    dataset: &dyn RasterDataset,
    gt: &GeoTransform,
    region: &Region,
    tile: &Tile,
    band: usize,
) -> RasterResult<TileExtrema> {
    let block = dataset.read_block(band, tile.col, tile.row, tile.width, tile.height)?;
    let mut local = TileExtrema::default();

    for (i, &value) in block.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        let col = tile.col + i % tile.width;
        let row = tile.row + i / tile.width;
        if region.is_masked() {
            let center = gt.pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
            if !region.contains(center) {
                continue;
            }
        }
        local.offer(Sample { value, col, row });
    }
    Ok(local)
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::source::MemoryRaster;
    use kadas_core::{Crs, DEFAULT_SEGMENT_ANGLE, Geometry, Rect};

    #[test]
    fn test_constant_raster_first_pixel_wins() {
        let raster = MemoryRaster::filled(512, 512, 7.0);
        let region = Region::rectangle(Rect::new(100.0, 100.0, 200.0, 200.0));
        let result = reduce_min_max(&raster, &region, &ReduceOptions::default()).unwrap();

        assert_eq!(result.min.value, 7.0);
        assert_eq!(result.max.value, 7.0);
        assert_eq!(result.min.geo, DVec2::new(100.0, 100.0));
        assert_eq!(result.max.geo, DVec2::new(100.0, 100.0));
        assert_eq!(result.samples, 101 * 101);
    }

    #[test]
    fn test_finds_extrema() {
        let mut raster = MemoryRaster::from_fn(64, 64, |col, row| (col + row) as f64);
        raster.set(10, 20, -5.0);
        raster.set(40, 3, 1000.0);
        let region = Region::rectangle(Rect::new(0.0, 0.0, 63.0, 63.0));
        let result =
            reduce_min_max(&raster, &region, &ReduceOptions::default().with_tile_size(16)).unwrap();

        assert_eq!((result.min.value, result.min.col, result.min.row), (-5.0, 10, 20));
        assert_eq!((result.max.value, result.max.col, result.max.row), (1000.0, 40, 3));
    }

    #[test]
    fn test_cross_tile_ties_keep_scan_order() {
        // Same maximum in the first tile of the second tile row and in the
        // second tile of the first tile row: the earlier tile wins.
        let mut raster = MemoryRaster::filled(32, 32, 0.0);
        raster.set(2, 20, 9.0);
        raster.set(20, 2, 9.0);
        let region = Region::rectangle(Rect::new(0.0, 0.0, 31.0, 31.0));

        for _ in 0..10 {
            let result =
                reduce_min_max(&raster, &region, &ReduceOptions::default().with_tile_size(16))
                    .unwrap();
            assert_eq!((result.max.col, result.max.row), (20, 2));
            assert_eq!((result.min.col, result.min.row), (0, 0));
        }
    }

    #[test]
    fn test_polygon_mask() {
        let mut raster = MemoryRaster::filled(100, 100, 1.0);
        // Inside the bounding box but outside the triangle
        raster.set(80, 30, 50.0);
        raster.set(30, 80, -50.0);
        // Inside the triangle
        raster.set(20, 20, 5.0);
        let triangle = Geometry::Polygon(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(100.0, 0.0),
            DVec2::new(0.0, 100.0),
        ]);
        let region = Region::from_geometry(&triangle, DEFAULT_SEGMENT_ANGLE).unwrap();
        let result = reduce_min_max(&raster, &region, &ReduceOptions::default()).unwrap();

        assert_eq!(result.max.value, 5.0);
        assert_eq!(result.min.value, 1.0);
    }

    #[test]
    fn test_circle_mask() {
        let mut raster = MemoryRaster::filled(100, 100, 0.0);
        // Corner of the bounding box, outside the circle
        raster.set(42, 42, 99.0);
        raster.set(50, 55, 3.0);
        let circle = Geometry::Circle {
            center: DVec2::new(50.0, 50.0),
            radius: 8.0,
        };
        let region = Region::from_geometry(&circle, DEFAULT_SEGMENT_ANGLE).unwrap();
        let result = reduce_min_max(&raster, &region, &ReduceOptions::default()).unwrap();
        assert_eq!(result.max.value, 3.0);
    }

    #[test]
    fn test_nan_samples_skipped() {
        let mut raster = MemoryRaster::filled(8, 8, f64::NAN);
        raster.set(3, 4, 2.5);
        let region = Region::rectangle(Rect::new(0.0, 0.0, 7.0, 7.0));
        let result = reduce_min_max(&raster, &region, &ReduceOptions::default()).unwrap();
        assert_eq!(result.samples, 1);
        assert_eq!((result.min.col, result.min.row), (3, 4));

        let empty = MemoryRaster::filled(8, 8, f64::NAN);
        assert_eq!(
            reduce_min_max(&empty, &region, &ReduceOptions::default()),
            Err(RasterError::EmptySelection)
        );
    }

    #[test]
    fn test_failures() {
        let region = Region::rectangle(Rect::new(600.0, 600.0, 700.0, 700.0));
        let raster = MemoryRaster::filled(512, 512, 1.0);
        assert_eq!(
            reduce_min_max(&raster, &region, &ReduceOptions::default()),
            Err(RasterError::EmptyWindow)
        );

        let inside = Region::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        let no_bands = MemoryRaster::new(16, 16, Some(GeoTransform::IDENTITY), Crs::default());
        assert_eq!(
            reduce_min_max(&no_bands, &inside, &ReduceOptions::default()),
            Err(RasterError::NoBands)
        );

        let no_gt = MemoryRaster::filled(16, 16, 1.0).with_geo_transform(None);
        assert_eq!(
            reduce_min_max(&no_gt, &inside, &ReduceOptions::default()),
            Err(RasterError::InvalidGeoTransform)
        );
    }

    #[test]
    fn test_north_up_geo_location() {
        let gt = GeoTransform::north_up(DVec2::new(2600000.0, 1200000.0), 10.0);
        let mut raster = MemoryRaster::filled(50, 50, 0.0).with_geo_transform(Some(gt));
        raster.set(5, 7, 12.0);
        let region = Region::rectangle(Rect::new(2600000.0, 1199500.0, 2600500.0, 1200000.0));
        let result = reduce_min_max(&raster, &region, &ReduceOptions::default()).unwrap();
        assert_eq!(result.max.geo, DVec2::new(2600050.0, 1199930.0));
    }

    #[test]
    fn test_cancel_and_progress() {
        let raster = MemoryRaster::filled(64, 64, 1.0);
        let region = Region::rectangle(Rect::new(0.0, 0.0, 63.0, 63.0));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let options = ReduceOptions::default()
            .with_tile_size(16)
            .with_progress(move |done, total| sink.lock().push((done, total)));
        reduce_min_max(&raster, &region, &options).unwrap();
        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen.len(), 16);
        assert_eq!(seen.last(), Some(&(16, 16)));

        let cancel = CancelToken::new();
        cancel.cancel();
        let options = ReduceOptions::default().with_cancel(cancel);
        assert_eq!(
            reduce_min_max(&raster, &region, &options),
            Err(RasterError::Cancelled)
        );
    }

    /// Provider whose datasets count how many of them are alive
    struct TrackingProvider {
        raster: Arc<MemoryRaster>,
        open: Arc<AtomicUsize>,
    }

    struct TrackedDataset {
        raster: Arc<MemoryRaster>,
        open: Arc<AtomicUsize>,
    }

    impl Drop for TrackedDataset {
        fn drop(&mut self) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl RasterDataset for TrackedDataset {
        fn width(&self) -> usize {
            self.raster.width()
        }

        fn height(&self) -> usize {
            self.raster.height()
        }

        fn band_count(&self) -> usize {
            self.raster.band_count()
        }

        fn geo_transform(&self) -> Option<GeoTransform> {
            self.raster.geo_transform()
        }

        fn crs(&self) -> &Crs {
            self.raster.crs()
        }

        fn read_block(
            &self,
            band: usize,
            col: usize,
            row: usize,
            width: usize,
            height: usize,
        ) -> RasterResult<Vec<f64>> {
            self.raster.read_block(band, col, row, width, height)
        }
    }

    impl RasterProvider for TrackingProvider {
        fn open(&self, _reference: &str) -> RasterResult<Box<dyn RasterDataset>> {
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(TrackedDataset {
                raster: self.raster.clone(),
                open: self.open.clone(),
            }))
        }

        fn crs(&self, _reference: &str) -> RasterResult<Crs> {
            Ok(self.raster.crs().clone())
        }
    }

    #[test]
    fn test_dataset_released_on_every_path() {
        let provider = TrackingProvider {
            raster: Arc::new(MemoryRaster::filled(64, 64, 3.0)),
            open: Arc::new(AtomicUsize::new(0)),
        };

        let inside = Region::rectangle(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(reduce_reference(&provider, "dem", &inside, &ReduceOptions::default()).is_ok());
        assert_eq!(provider.open.load(Ordering::SeqCst), 0);

        let outside = Region::rectangle(Rect::new(100.0, 100.0, 110.0, 110.0));
        assert_eq!(
            reduce_reference(&provider, "dem", &outside, &ReduceOptions::default()),
            Err(RasterError::EmptyWindow)
        );
        assert_eq!(provider.open.load(Ordering::SeqCst), 0);
    }
}
