//! Input events fed into map tools and notifications they emit

use glam::{DVec2, IVec2};
use kadas_core::{ItemId, ItemState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// A pointer event with its position in both map and screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapMouseEvent {
    #[serde(default)]
    pub button: MouseButton,
    /// Position in canvas (display) CRS
    pub map_pos: DVec2,
    /// Position in widget pixels
    #[serde(default)]
    pub screen_pos: IVec2,
}

impl MapMouseEvent {
    pub fn new(button: MouseButton, map_pos: DVec2) -> Self {
        Self {
            button,
            map_pos,
            screen_pos: IVec2::ZERO,
        }
    }

    pub fn at_screen(mut self, screen_pos: IVec2) -> Self {
        self.screen_pos = screen_pos;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
        alt: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Whether this is exactly Ctrl + `c` (case insensitive)
    pub fn is_ctrl_char(&self, c: char) -> bool {
        self.modifiers == Modifiers::CTRL
            && matches!(self.key, Key::Char(k) if k.eq_ignore_ascii_case(&c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageLevel {
    Info,
    Warning,
    Critical,
}

/// Notifications a tool emits for its host
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// A fresh item was created and is ready to be drawn
    CreationStarted { item: ItemId },
    /// The item reached `Finished`
    CreationFinished { item: ItemId, state: ItemState },
    /// The tool asks to be unset from the canvas
    ExitRequested,
    /// A user-facing message
    Message { level: MessageLevel, text: String },
}

impl ToolEvent {
    pub fn warning(text: impl Into<String>) -> Self {
        ToolEvent::Message {
            level: MessageLevel::Warning,
            text: text.into(),
        }
    }
}
