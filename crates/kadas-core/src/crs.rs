//! Coordinate reference systems and the transform capability
//!
//! The projection math itself lives in the host GIS library. Items and
//! tools only see the [`CoordinateTransform`] trait.

use std::collections::HashMap;
use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::{ItemError, ItemResult};

/// A coordinate reference system, identified by its authority id (e.g. `EPSG:2056`)
///
/// The default CRS has an empty id and stands for "unknown".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Crs(String);

impl Crs {
    /// Create a CRS from an authority id
    pub fn new(authid: impl Into<String>) -> Self {
        Self(authid.into())
    }

    /// Get the authority id
    pub fn authid(&self) -> &str {
        &self.0
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(authid: &str) -> Self {
        Self::new(authid)
    }
}

/// Direction of a transform relative to its (source, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransformDirection {
    /// Source to target
    #[default]
    Forward,
    /// Target to source
    Reverse,
}

/// Capability to transform points between coordinate reference systems
pub trait CoordinateTransform: Send + Sync {
    /// Transform `point` between `source` and `target` in the given direction
    fn transform(
        &self,
        point: DVec2,
        source: &Crs,
        target: &Crs,
        direction: TransformDirection,
    ) -> ItemResult<DVec2>;
}

/// Transform that only accepts identical source and target systems
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    fn transform(
        &self,
        point: DVec2,
        source: &Crs,
        target: &Crs,
        _direction: TransformDirection,
    ) -> ItemResult<DVec2> {
        if source == target {
            Ok(point)
        } else {
            Err(ItemError::Transform {
                from: source.clone(),
                to: target.clone(),
            })
        }
    }
}

/// Table of per-pair scale + offset transforms
///
/// Stands in for a projection engine where only linear relations between
/// systems are needed (local grids, tests, replay sessions).
#[derive(Debug, Clone, Default)]
pub struct AffineTransform {
    pairs: HashMap<(Crs, Crs), (DVec2, DVec2)>,
}

impl AffineTransform {
    /// Create an empty table (only identical systems can be transformed)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `target = source * scale + offset`
    pub fn with_pair(mut self, source: Crs, target: Crs, scale: DVec2, offset: DVec2) -> Self {
        self.pairs.insert((source, target), (scale, offset));
        self
    }

    fn apply(&self, point: DVec2, from: &Crs, to: &Crs) -> ItemResult<DVec2> {
        if from == to {
            return Ok(point);
        }
        if let Some((scale, offset)) = self.pairs.get(&(from.clone(), to.clone())) {
            return Ok(point * *scale + *offset);
        }
        if let Some((scale, offset)) = self.pairs.get(&(to.clone(), from.clone())) {
            return Ok((point - *offset) / *scale);
        }
        Err(ItemError::Transform {
            from: from.clone(),
            to: to.clone(),
        })
    }
}

impl CoordinateTransform for AffineTransform {
    fn transform(
        &self,
        point: DVec2,
        source: &Crs,
        target: &Crs,
        direction: TransformDirection,
    ) -> ItemResult<DVec2> {
        match direction {
            TransformDirection::Forward => self.apply(point, source, target),
            TransformDirection::Reverse => self.apply(point, target, source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_same_crs() {
        let crs = Crs::new("EPSG:2056");
        let p = IdentityTransform
            .transform(DVec2::new(1.0, 2.0), &crs, &crs, TransformDirection::Forward)
            .unwrap();
        assert_eq!(p, DVec2::new(1.0, 2.0));
    }

    #[test]
    fn test_identity_rejects_other_crs() {
        let result = IdentityTransform.transform(
            DVec2::ZERO,
            &Crs::new("EPSG:2056"),
            &Crs::new("EPSG:4326"),
            TransformDirection::Forward,
        );
        assert!(matches!(result, Err(ItemError::Transform { .. })));
    }

    #[test]
    fn test_affine_forward_and_reverse() {
        let local = Crs::new("LOCAL:grid");
        let world = Crs::new("EPSG:3857");
        let transform = AffineTransform::new().with_pair(
            local.clone(),
            world.clone(),
            DVec2::new(2.0, 2.0),
            DVec2::new(100.0, -50.0),
        );

        let p = transform
            .transform(DVec2::new(10.0, 10.0), &local, &world, TransformDirection::Forward)
            .unwrap();
        assert_relative_eq!(p.x, 120.0);
        assert_relative_eq!(p.y, -30.0);

        let back = transform
            .transform(p, &local, &world, TransformDirection::Reverse)
            .unwrap();
        assert_relative_eq!(back.x, 10.0);
        assert_relative_eq!(back.y, 10.0);

        // Pair registered once works in the opposite orientation too
        let swapped = transform
            .transform(p, &world, &local, TransformDirection::Forward)
            .unwrap();
        assert_relative_eq!(swapped.x, 10.0);
    }
}
