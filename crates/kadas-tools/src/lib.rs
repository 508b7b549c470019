//! Kadas Map Tools
//!
//! Interactive map tools on top of the core item model:
//! - Canvas: what a tool needs from the map view, plus a headless canvas
//! - CreateItem: draws one item at a time and hands it to a layer
//! - MinMax: marks the lowest and highest heightmap sample in a region
//! - FeaturePicker: hit-testing of layer features around a map position
//! - NumericInput: typed coordinates while drawing
//! - Config: persisted tool settings
//! - Session: scripted replay of tool input

pub mod canvas;
pub mod config;
pub mod create_item;
pub mod error;
pub mod events;
pub mod feature_picker;
pub mod layer;
pub mod minmax;
pub mod numeric_input;
pub mod session;

pub use canvas::{HeadlessCanvas, MapCanvas};
pub use config::{AppConfig, ConfigManager, MinMaxConfig, ToolsConfig};
pub use create_item::{CreateItemTool, ItemFactory};
pub use error::{ToolError, ToolResult};
pub use events::*;
pub use feature_picker::{FeaturePicker, PickResult, PickSource};
pub use layer::{ItemLayer, MemoryItemLayer, SharedLayer};
pub use minmax::{FilterType, MinMaxResult, MinMaxTool};
pub use numeric_input::NumericInput;
pub use session::{Session, SessionReport};
