//! Keyboard shortcut registry.

use crate::input::Modifiers;

/// Editor commands reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    Undo,
    Redo,
    Copy,
    Paste,
    Cut,
    Duplicate,
    SelectAll,
    Delete,
    MakeAnchor,
    Cancel,
}

/// A keyboard shortcut definition. `command` means Ctrl, or Cmd on macOS.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub command: bool,
    pub shift: bool,
    pub action: EditorAction,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        command: bool,
        shift: bool,
        action: EditorAction,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }

    fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.key.eq_ignore_ascii_case(key)
            && self.command == modifiers.command()
            && self.shift == modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, EditorAction::Undo, "Undo"),
            Shortcut::new("Z", true, true, EditorAction::Redo, "Redo"),
            Shortcut::new("Y", true, false, EditorAction::Redo, "Redo"),
            Shortcut::new("C", true, false, EditorAction::Copy, "Copy selection"),
            Shortcut::new("V", true, false, EditorAction::Paste, "Paste"),
            Shortcut::new("X", true, false, EditorAction::Cut, "Cut selection"),
            Shortcut::new("D", true, false, EditorAction::Duplicate, "Duplicate selection"),
            Shortcut::new("A", true, false, EditorAction::SelectAll, "Select all on the active layer"),
            Shortcut::new("G", true, false, EditorAction::MakeAnchor, "Group selection into an anchor block"),
            Shortcut::new("Delete", false, false, EditorAction::Delete, "Delete selection"),
            Shortcut::new("Backspace", false, false, EditorAction::Delete, "Delete selection"),
            Shortcut::new("Escape", false, false, EditorAction::Cancel, "Cancel current gesture"),
        ]
    }

    /// Action bound to `key` under `modifiers`, if any.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<EditorAction> {
        Self::all()
            .into_iter()
            .find(|s| s.matches(key, modifiers))
            .map(|s| s.action)
    }
}
