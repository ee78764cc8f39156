//! Pointer and keyboard input model.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

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

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Keyboard event carrying the key name (`"z"`, `"Delete"`, `"Escape"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Tracks pointer, button and modifier state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Pointer position before the latest move.
    pub previous_pointer_position: Point,
    pressed_buttons: HashSet<MouseButton>,
    pub modifiers: Modifiers,
    /// Keyboard shortcuts are suppressed while a text field has focus.
    pub text_input_focused: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        match event {
            PointerEvent::Down { position, button } => {
                self.pointer_position = *position;
                self.pressed_buttons.insert(*button);
            }
            PointerEvent::Up { position, button } => {
                self.pointer_position = *position;
                self.pressed_buttons.remove(button);
            }
            PointerEvent::Move { position } => {
                self.previous_pointer_position = self.pointer_position;
                self.pointer_position = *position;
            }
            PointerEvent::Scroll { .. } => {}
        }
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.pressed_buttons.contains(&button)
    }

    /// Screen-space movement since the previous move event.
    pub fn pointer_delta(&self) -> Vec2 {
        self.pointer_position - self.previous_pointer_position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_tracking() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(1.0, 2.0),
            button: MouseButton::Left,
        });
        assert!(input.is_button_pressed(MouseButton::Left));
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(4.0, 6.0),
        });
        assert_eq!(input.pointer_delta(), Vec2::new(3.0, 4.0));
        input.handle_pointer_event(&PointerEvent::Up {
            position: Point::new(4.0, 6.0),
            button: MouseButton::Left,
        });
        assert!(!input.is_button_pressed(MouseButton::Left));
    }

    #[test]
    fn test_command_modifier() {
        assert!(!Modifiers::NONE.command());
        let meta = Modifiers {
            meta: true,
            ..Modifiers::default()
        };
        assert!(meta.command());
    }
}
