//! Keyboard shortcut registry.

use crate::input::{Key, Modifiers};
use kurbo::Vec2;

/// An editor command reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditorCommand {
    Delete,
    Group,
    Ungroup,
    Duplicate,
    BringToFront,
    SendToBack,
    BringForward,
    SendBackward,
    SelectAll,
    ToggleLock,
    ClearSelection,
    /// Unit direction; the session scales it by the configured nudge step.
    Nudge { direction: Vec2, large: bool },
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub command: EditorCommand,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: Key,
        ctrl: bool,
        shift: bool,
        command: EditorCommand,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            command,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+G").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(self.key.name());
        parts.join("+")
    }

    fn matches(&self, key: Key, modifiers: Modifiers) -> bool {
        let key_matches = match (self.key, key) {
            (Key::Character(a), Key::Character(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        };
        key_matches && self.ctrl == modifiers.command() && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use EditorCommand as C;
        let ctrl = |c: char, command: EditorCommand, description: &'static str| {
            Shortcut::new(Key::Character(c), true, false, command, description)
        };
        let plain = |key: Key, command: EditorCommand, description: &'static str| {
            Shortcut::new(key, false, false, command, description)
        };

        let mut shortcuts = vec![
            ctrl('a', C::SelectAll, "Select all shapes"),
            ctrl('g', C::Group, "Group selected shapes"),
            Shortcut::new(Key::Character('g'), true, true, C::Ungroup, "Ungroup selected shapes"),
            ctrl('d', C::Duplicate, "Duplicate selected shapes"),
            ctrl('l', C::ToggleLock, "Lock or unlock selected shapes"),
            ctrl(']', C::BringToFront, "Bring to front"),
            ctrl('[', C::SendToBack, "Send to back"),
            plain(Key::Character(']'), C::BringForward, "Bring forward"),
            plain(Key::Character('['), C::SendBackward, "Send backward"),
            plain(Key::Delete, C::Delete, "Delete selected shapes"),
            plain(Key::Backspace, C::Delete, "Delete selected shapes"),
            plain(Key::Escape, C::ClearSelection, "Clear selection"),
        ];

        let arrows = [
            (Key::ArrowLeft, "Nudge left", "Nudge left (large)"),
            (Key::ArrowRight, "Nudge right", "Nudge right (large)"),
            (Key::ArrowUp, "Nudge up", "Nudge up (large)"),
            (Key::ArrowDown, "Nudge down", "Nudge down (large)"),
        ];
        for large in [false, true] {
            for (key, small_label, large_label) in arrows {
                let Some(direction) = key.arrow_direction() else { continue };
                let description = if large { large_label } else { small_label };
                let command = C::Nudge { direction, large };
                shortcuts.push(Shortcut::new(key, false, large, command, description));
            }
        }
        shortcuts
    }

    /// Find the command bound to a key press.
    pub fn resolve(key: Key, modifiers: Modifiers) -> Option<EditorCommand> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.command)
    }
}
