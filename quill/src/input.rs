//! Input events as the field sees them, independent of any UI toolkit.

use crate::surface::Hit;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Backspace,
    Delete,
    Enter,
    Escape,
    Char(char),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
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

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// True if any modifier that turns a char key into a shortcut is held.
    pub fn is_command(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    FocusGained,
    FocusLost,
    PointerDown(Hit),
    PointerUp(Hit),
    KeyPress(Key, Modifiers),
    Paste(String),
}

impl InputEvent {
    pub fn key(key: Key) -> Self {
        Self::KeyPress(key, Modifiers::NONE)
    }
}
