//! Replay sessions: scripted input for the min/max tool on a headless canvas
//!
//! A session is a RON file describing the heightmap, optional vector features
//! to pick from, and the sequence of user actions.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use glam::DVec2;
use kadas_core::{CircleItem, Crs, Geometry, MapItem, MapSettings, PolygonItem, Rect};
use kadas_raster::{GeoTransform, MemoryRaster, MemoryRasterProvider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::HeadlessCanvas;
use crate::config::AppConfig;
use crate::events::{KeyEvent, MapMouseEvent, MouseButton, ToolEvent};
use crate::layer::{ItemLayer, MemoryItemLayer};
use crate::minmax::{FilterType, MinMaxResult, MinMaxTool};

/// Reference under which the session raster is registered
pub const SESSION_HEIGHTMAP: &str = "session:heightmap";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

/// In-memory heightmap description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRaster {
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub fill: f64,
    /// Individual samples as (col, row, value)
    #[serde(default)]
    pub values: Vec<(usize, usize, f64)>,
    #[serde(default = "default_geo_transform")]
    pub geo_transform: Option<GeoTransform>,
    #[serde(default)]
    pub crs: Crs,
    /// Set to 0 for a raster without bands
    #[serde(default = "default_bands")]
    pub bands: usize,
}

fn default_geo_transform() -> Option<GeoTransform> {
    Some(GeoTransform::IDENTITY)
}

fn default_bands() -> usize {
    1
}

impl SessionRaster {
    pub fn build(&self) -> MemoryRaster {
        let mut raster =
            MemoryRaster::new(self.width, self.height, self.geo_transform, self.crs.clone());
        if self.bands == 0 {
            return raster;
        }
        for _ in 0..self.bands {
            raster = raster.with_band(vec![self.fill; self.width * self.height]);
        }
        for &(col, row, value) in &self.values {
            raster.set(col, row, value);
        }
        raster
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionAction {
    Press(MapMouseEvent),
    Move(MapMouseEvent),
    Release(MapMouseEvent),
    Key(KeyEvent),
    Filter(FilterType),
    Pick,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Canvas CRS
    #[serde(default)]
    pub crs: Crs,
    #[serde(default = "default_map_units_per_pixel")]
    pub map_units_per_pixel: f64,
    /// Omit to replay without a heightmap
    #[serde(default)]
    pub raster: Option<SessionRaster>,
    /// Features on the pickable layer, in the canvas CRS
    #[serde(default)]
    pub features: Vec<Geometry>,
    #[serde(default)]
    pub background: bool,
    pub actions: Vec<SessionAction>,
}

fn default_map_units_per_pixel() -> f64 {
    1.0
}

/// Everything the tool reported while replaying
#[derive(Debug, Default)]
pub struct SessionReport {
    pub events: Vec<ToolEvent>,
    pub results: Vec<MinMaxResult>,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SessionError> {
        Ok(ron::from_str(content)?)
    }

    pub fn run(&self, config: &AppConfig) -> SessionReport {
        let provider = MemoryRasterProvider::new();
        let mut config = config.clone();
        if let Some(raster) = &self.raster {
            provider.insert(SESSION_HEIGHTMAP, raster.build());
            config.minmax.heightmap = Some(SESSION_HEIGHTMAP.to_string());
        }

        let mut canvas = self.canvas();
        let mut tool = MinMaxTool::new(Arc::new(provider), &config);
        tool.set_background(self.background);
        tool.activate(&mut canvas);

        let mut report = SessionReport::default();
        for action in &self.actions {
            tracing::debug!("Replaying {:?}", action);
            match action {
                SessionAction::Press(e) => tool.press(&mut canvas, e),
                SessionAction::Move(e) => tool.mouse_move(&mut canvas, e),
                SessionAction::Release(e) => tool.release(&mut canvas, e),
                SessionAction::Key(e) => tool.key(&mut canvas, e),
                SessionAction::Filter(f) => tool.set_filter_type(&mut canvas, *f),
                SessionAction::Pick => tool.request_pick(),
            }
            while tool.is_busy() && !tool.poll(&mut canvas) {
                std::thread::sleep(Duration::from_millis(1));
            }

            let events = tool.take_events();
            let finished = events
                .iter()
                .any(|e| matches!(e, ToolEvent::CreationFinished { .. }));
            if finished && let Some(result) = tool.result() {
                report.results.push(result.clone());
            }
            report.events.extend(events);
        }

        tool.deactivate(&mut canvas);
        report.events.extend(tool.take_events());
        report
    }

    fn canvas(&self) -> HeadlessCanvas {
        let settings = MapSettings::new(self.crs.clone(), Rect::empty(), self.map_units_per_pixel);
        let mut canvas = HeadlessCanvas::new(settings);
        if self.features.is_empty() {
            return canvas;
        }

        let mut layer = MemoryItemLayer::new("Features");
        for geometry in &self.features {
            let mut item: Box<dyn MapItem> = if geometry.is_curved() {
                Box::new(CircleItem::new(self.crs.clone()))
            } else {
                Box::new(PolygonItem::new(self.crs.clone()))
            };
            if item.add_part_from_geometry(geometry) {
                layer.add_item(item);
            } else {
                tracing::warn!("Skipping unsupported feature {:?}", geometry.geometry_type());
            }
        }
        canvas.add_layer(layer.shared().1);
        canvas
    }
}

/// Human readable summary of a replay
pub fn format_report(report: &SessionReport) -> String {
    let mut lines = Vec::new();
    for result in &report.results {
        lines.push(format!(
            "min {} at ({:.3}, {:.3}), max {} at ({:.3}, {:.3})",
            result.min.value,
            result.min_pos.x,
            result.min_pos.y,
            result.max.value,
            result.max_pos.x,
            result.max_pos.y
        ));
    }
    for event in &report.events {
        if let ToolEvent::Message { level, text } = event {
            lines.push(format!("{:?}: {}", level, text));
        }
    }
    lines.join("\n")
}

/// Shortcut for scripted clicks
pub fn click(x: f64, y: f64) -> SessionAction {
    SessionAction::Press(MapMouseEvent::new(MouseButton::Left, DVec2::new(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = r#"(
        raster: Some((
            width: 64,
            height: 64,
            fill: 5.0,
            values: [(10, 12, -3.0), (40, 41, 88.5)],
        )),
        actions: [
            Press((map_pos: (2.0, 2.0))),
            Move((map_pos: (30.0, 30.0))),
            Press((map_pos: (50.0, 50.0))),
        ],
    )"#;

    #[test]
    fn test_parse_defaults() {
        let session = Session::parse(SESSION).unwrap();
        assert_eq!(session.map_units_per_pixel, 1.0);
        assert!(!session.background);
        let raster = session.raster.as_ref().unwrap();
        assert_eq!(raster.bands, 1);
        assert_eq!(raster.geo_transform, Some(GeoTransform::IDENTITY));
        assert_eq!(session.actions.len(), 3);
    }

    #[test]
    fn test_replay_rectangle() {
        let session = Session::parse(SESSION).unwrap();
        let report = session.run(&AppConfig::new());
        assert_eq!(report.results.len(), 1);

        let result = &report.results[0];
        assert_eq!(result.min.value, -3.0);
        assert_eq!(result.min_pos, DVec2::new(10.0, 12.0));
        assert_eq!(result.max.value, 88.5);
        assert_eq!(result.max_pos, DVec2::new(40.0, 41.0));

        let text = format_report(&report);
        assert!(text.starts_with("min -3 at (10.000, 12.000)"));
    }

    #[test]
    fn test_replay_without_raster_warns() {
        let session = Session {
            crs: Crs::default(),
            map_units_per_pixel: 1.0,
            raster: None,
            features: Vec::new(),
            background: false,
            actions: vec![click(0.0, 0.0), click(5.0, 5.0)],
        };
        let report = session.run(&AppConfig::new());
        assert!(report.results.is_empty());
        assert!(format_report(&report).starts_with("Warning: No heightmap"));
    }

    #[test]
    fn test_missing_file() {
        let err = Session::load(Path::new("/nonexistent/session.ron")).unwrap_err();
        assert!(matches!(err, SessionError::Io(_)));
    }
}
