//! Input events consumed by the editor session.
//!
//! Pointer positions are in screen coordinates; the session maps them to
//! canvas space through its camera.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Logical keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Delete,
    Backspace,
    Enter,
    Escape,
    Character(char),
}

impl Key {
    /// Display name used in shortcut listings.
    pub fn name(&self) -> String {
        match self {
            Key::ArrowLeft => "Left".to_string(),
            Key::ArrowRight => "Right".to_string(),
            Key::ArrowUp => "Up".to_string(),
            Key::ArrowDown => "Down".to_string(),
            Key::Delete => "Delete".to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::Enter => "Enter".to_string(),
            Key::Escape => "Escape".to_string(),
            Key::Character(c) => c.to_ascii_uppercase().to_string(),
        }
    }

    /// Unit direction of an arrow key.
    pub fn arrow_direction(&self) -> Option<Vec2> {
        match self {
            Key::ArrowLeft => Some(Vec2::new(-1.0, 0.0)),
            Key::ArrowRight => Some(Vec2::new(1.0, 0.0)),
            Key::ArrowUp => Some(Vec2::new(0.0, -1.0)),
            Key::ArrowDown => Some(Vec2::new(0.0, 1.0)),
            _ => None,
        }
    }
}

/// A single input event delivered to the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EditorEvent {
    PointerDown {
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: Point,
        modifiers: Modifiers,
    },
    PointerUp {
        position: Point,
        button: MouseButton,
    },
    DoubleClick {
        position: Point,
    },
    Wheel {
        delta: Vec2,
        modifiers: Modifiers,
    },
    Key {
        key: Key,
        modifiers: Modifiers,
    },
    /// Replace the text being edited (e.g. from an IME or text field).
    EditText(String),
    /// The text editor lost focus.
    Blur,
}

impl EditorEvent {
    pub fn left_down(position: Point) -> Self {
        EditorEvent::PointerDown {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn shift_down(position: Point) -> Self {
        EditorEvent::PointerDown {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::SHIFT,
        }
    }

    pub fn moved(position: Point) -> Self {
        EditorEvent::PointerMove {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn left_up(position: Point) -> Self {
        EditorEvent::PointerUp {
            position,
            button: MouseButton::Left,
        }
    }

    pub fn key(key: Key) -> Self {
        EditorEvent::Key {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key_with(key: Key, modifiers: Modifiers) -> Self {
        EditorEvent::Key { key, modifiers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_modifier() {
        assert!(Modifiers::CTRL.command());
        assert!(Modifiers { meta: true, ..Modifiers::NONE }.command());
        assert!(!Modifiers::SHIFT.command());
    }

    #[test]
    fn test_arrow_direction() {
        assert_eq!(Key::ArrowUp.arrow_direction(), Some(Vec2::new(0.0, -1.0)));
        assert_eq!(Key::Enter.arrow_direction(), None);
    }

    #[test]
    fn test_key_name_uppercases_characters() {
        assert_eq!(Key::Character('g').name(), "G");
        assert_eq!(Key::Backspace.name(), "Backspace");
    }
}
