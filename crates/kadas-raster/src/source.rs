//! Raster access capability and an in-memory implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use kadas_core::Crs;
use parking_lot::RwLock;

use crate::error::{RasterError, RasterResult};
use crate::geotransform::GeoTransform;

/// An opened raster dataset
///
/// The handle is released when the boxed dataset is dropped.
pub trait RasterDataset: Send + Sync {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn band_count(&self) -> usize;

    /// Georeferencing, `None` when the dataset has none
    fn geo_transform(&self) -> Option<GeoTransform>;

    fn crs(&self) -> &Crs;

    /// Read a `width` x `height` block of `band` (0-based) in row-major order
    ///
    /// Pixels outside the raster read as zero.
    fn read_block(
        &self,
        band: usize,
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    ) -> RasterResult<Vec<f64>>;
}

impl<T: RasterDataset + ?Sized> RasterDataset for Arc<T> {
    fn width(&self) -> usize {
        (**self).width()
    }

    fn height(&self) -> usize {
        (**self).height()
    }

    fn band_count(&self) -> usize {
        (**self).band_count()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        (**self).geo_transform()
    }

    fn crs(&self) -> &Crs {
        (**self).crs()
    }

    fn read_block(
        &self,
        band: usize,
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    ) -> RasterResult<Vec<f64>> {
        (**self).read_block(band, col, row, width, height)
    }
}

/// Opens raster datasets by reference (file path, URI, layer id ...)
pub trait RasterProvider: Send + Sync {
    fn open(&self, reference: &str) -> RasterResult<Box<dyn RasterDataset>>;

    /// CRS of `reference`, read from metadata without opening the dataset
    fn crs(&self, reference: &str) -> RasterResult<Crs>;
}

/// A raster held in memory, one `Vec` per band
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRaster {
    width: usize,
    height: usize,
    bands: Vec<Vec<f64>>,
    geo_transform: Option<GeoTransform>,
    crs: Crs,
}

impl MemoryRaster {
    /// Raster without bands
    pub fn new(width: usize, height: usize, geo_transform: Option<GeoTransform>, crs: Crs) -> Self {
        Self {
            width,
            height,
            bands: Vec::new(),
            geo_transform,
            crs,
        }
    }

    /// Single-band raster with every sample set to `value`
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self::from_fn(width, height, |_, _| value)
    }

    /// Single-band raster with identity georeferencing, sample at (col, row) is `f(col, row)`
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let data = (0..height)
            .flat_map(|row| (0..width).map(move |col| (col, row)))
            .map(|(col, row)| f(col, row))
            .collect();
        Self::new(width, height, Some(GeoTransform::IDENTITY), Crs::default()).with_band(data)
    }

    /// Append a band; `data` is row-major and resized to `width * height`
    pub fn with_band(mut self, mut data: Vec<f64>) -> Self {
        data.resize(self.width * self.height, 0.0);
        self.bands.push(data);
        self
    }

    pub fn with_geo_transform(mut self, geo_transform: Option<GeoTransform>) -> Self {
        self.geo_transform = geo_transform;
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = crs;
        self
    }

    /// Overwrite one sample of the first band
    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        if col < self.width
            && row < self.height
            && let Some(band) = self.bands.first_mut()
        {
            band[row * self.width + col] = value;
        }
    }
}

impl RasterDataset for MemoryRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    fn crs(&self) -> &Crs {
        &self.crs
    }

    fn read_block(
        &self,
        band: usize,
        col: usize,
        row: usize,
        width: usize,
        height: usize,
    ) -> RasterResult<Vec<f64>> {
        let data = self.bands.get(band).ok_or(RasterError::BandOutOfRange {
            band,
            count: self.bands.len(),
        })?;

        let mut block = vec![0.0; width * height];
        for r in 0..height {
            let src_row = row + r;
            if src_row >= self.height || col >= self.width {
                continue;
            }
            let n = width.min(self.width - col);
            let src = src_row * self.width + col;
            block[r * width..r * width + n].copy_from_slice(&data[src..src + n]);
        }
        Ok(block)
    }
}

/// Provider resolving references against registered in-memory rasters
#[derive(Debug, Default)]
pub struct MemoryRasterProvider {
    rasters: RwLock<HashMap<String, Arc<MemoryRaster>>>,
    opened: AtomicUsize,
}

impl MemoryRasterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, reference: impl Into<String>, raster: MemoryRaster) {
        self.rasters.write().insert(reference.into(), Arc::new(raster));
    }

    pub fn remove(&self, reference: &str) -> bool {
        self.rasters.write().remove(reference).is_some()
    }

    /// Number of successful `open` calls so far
    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    fn get(&self, reference: &str) -> RasterResult<Arc<MemoryRaster>> {
        self.rasters.read().get(reference).cloned().ok_or_else(|| RasterError::Open {
            reference: reference.to_string(),
            reason: "no such raster".to_string(),
        })
    }
}

impl RasterProvider for MemoryRasterProvider {
    fn open(&self, reference: &str) -> RasterResult<Box<dyn RasterDataset>> {
        let raster = self.get(reference)?;
        self.opened.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Opened in-memory raster '{}'", reference);
        Ok(Box::new(raster))
    }

    fn crs(&self, reference: &str) -> RasterResult<Crs> {
        Ok(self.get(reference)?.crs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: usize, height: usize) -> MemoryRaster {
        MemoryRaster::from_fn(width, height, |col, row| (row * 10 + col) as f64)
    }

    #[test]
    fn test_read_block_inside() {
        let raster = numbered(5, 4);
        let block = raster.read_block(0, 1, 2, 3, 2).unwrap();
        assert_eq!(block, vec![21.0, 22.0, 23.0, 31.0, 32.0, 33.0]);
    }

    #[test]
    fn test_read_block_zero_fills_outside() {
        let raster = numbered(3, 3);
        let block = raster.read_block(0, 2, 1, 2, 3).unwrap();
        assert_eq!(block, vec![12.0, 0.0, 22.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_read_block_band_out_of_range() {
        let raster = MemoryRaster::new(2, 2, None, Crs::default());
        assert_eq!(raster.band_count(), 0);
        assert_eq!(
            raster.read_block(0, 0, 0, 1, 1),
            Err(RasterError::BandOutOfRange { band: 0, count: 0 })
        );
    }

    #[test]
    fn test_provider_open() {
        let provider = MemoryRasterProvider::new();
        provider.insert("dem", MemoryRaster::filled(4, 4, 1.5));

        let dataset = provider.open("dem").unwrap();
        assert_eq!((dataset.width(), dataset.height()), (4, 4));
        assert_eq!(dataset.read_block(0, 3, 3, 1, 1).unwrap(), vec![1.5]);

        assert!(matches!(provider.open("missing"), Err(RasterError::Open { .. })));
        assert_eq!(provider.open_count(), 1);
        assert!(provider.remove("dem"));
        assert!(provider.open("dem").is_err());
    }

    #[test]
    fn test_provider_crs_without_open() {
        let provider = MemoryRasterProvider::new();
        provider.insert("dem", MemoryRaster::filled(4, 4, 0.0).with_crs(Crs::new("EPSG:2056")));

        assert_eq!(provider.crs("dem"), Ok(Crs::new("EPSG:2056")));
        assert!(matches!(provider.crs("missing"), Err(RasterError::Open { .. })));
        assert_eq!(provider.open_count(), 0);
    }
}
