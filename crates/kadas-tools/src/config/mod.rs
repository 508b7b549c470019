//! Map tool configuration
//!
//! Persistent settings of the creation and min/max tools, stored as RON.

mod manager;

pub use manager::{ConfigError, ConfigManager, SharedConfig};

use kadas_core::{DEFAULT_HISTORY_LIMIT, DEFAULT_SEGMENT_ANGLE};
use kadas_raster::DEFAULT_TILE_SIZE;
use serde::{Deserialize, Serialize};

/// Item creation tool preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    /// Show the numeric input fields while drawing
    pub show_numeric_input: bool,
    /// Maximum number of undo snapshots per tool session
    pub history_limit: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            show_numeric_input: false,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Min/max tool settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinMaxConfig {
    /// Side length of the raster tiles read at once
    pub tile_size: usize,
    /// Angular step (radians) used to approximate circular regions
    pub circle_segment_angle: f64,
    /// Reference of the raster used as heightmap
    pub heightmap: Option<String>,
}

impl Default for MinMaxConfig {
    fn default() -> Self {
        Self {
            tile_size: DEFAULT_TILE_SIZE,
            circle_segment_angle: DEFAULT_SEGMENT_ANGLE,
            heightmap: None,
        }
    }
}

/// Complete tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Configuration format version
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub minmax: MinMaxConfig,
}

impl AppConfig {
    /// Current configuration version
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::new();
        assert_eq!(config.version, AppConfig::CURRENT_VERSION);
        assert!(!config.tools.show_numeric_input);
        assert_eq!(config.tools.history_limit, 100);
        assert_eq!(config.minmax.tile_size, 256);
        assert!(config.minmax.heightmap.is_none());
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let content = r#"(
            version: 1,
            minmax: (tile_size: 64, circle_segment_angle: 0.1, heightmap: Some("dem.tif")),
        )"#;
        let config: AppConfig = ron::from_str(content).unwrap();
        assert_eq!(config.tools, ToolsConfig::default());
        assert_eq!(config.minmax.tile_size, 64);
        assert_eq!(config.minmax.heightmap.as_deref(), Some("dem.tif"));
    }
}
