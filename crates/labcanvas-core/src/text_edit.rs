//! In-place text editing of a single shape.

use crate::input::{Key, Modifiers};
use crate::shapes::ShapeId;

/// What a key press did to the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Still editing.
    Continue,
    /// Write the buffer back to the shape.
    Commit,
    /// Discard the buffer.
    Cancel,
}

/// An open text edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub shape_id: ShapeId,
    pub buffer: String,
}

impl TextEdit {
    pub fn new(shape_id: ShapeId, initial: &str) -> Self {
        Self {
            shape_id,
            buffer: initial.to_string(),
        }
    }

    /// Replace the whole buffer.
    pub fn set_text(&mut self, text: String) {
        self.buffer = text;
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> EditOutcome {
        match key {
            Key::Enter if modifiers.shift => {
                self.buffer.push('\n');
                EditOutcome::Continue
            }
            Key::Enter => EditOutcome::Commit,
            Key::Escape => EditOutcome::Cancel,
            Key::Backspace => {
                self.buffer.pop();
                EditOutcome::Continue
            }
            Key::Character(c) if !modifiers.command() => {
                self.buffer.push(c);
                EditOutcome::Continue
            }
            _ => EditOutcome::Continue,
        }
    }
}
