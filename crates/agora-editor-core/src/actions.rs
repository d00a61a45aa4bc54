//! Keyboard input types shared with host adapters.

use smol_str::SmolStr;

/// Key values for keyboard input.
///
/// Host adapters convert native key events to this enum before handing them
/// to the controller. Only backspace drives editor behavior; every other named
/// key is carried through as [`Key::Named`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A character key.
    Character(SmolStr),

    Backspace,

    /// Any other named key, by its DOM name (`"Enter"`, `"ArrowLeft"`).
    Named(SmolStr),
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    /// Parse a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        match key {
            "Backspace" => Self::Backspace,
            other if other.chars().count() == 1 => Self::Character(SmolStr::new(other)),
            other => Self::Named(SmolStr::new(other)),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let platform handle it.
    NotHandled,
    /// Event should be passed through (navigation, etc.).
    PassThrough,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dom() {
        assert_eq!(Key::from_dom("Backspace"), Key::Backspace);
        assert_eq!(Key::from_dom("a"), Key::character("a"));
        assert_eq!(Key::from_dom("é"), Key::character("é"));
        assert_eq!(Key::from_dom(" "), Key::character(" "));
        assert_eq!(Key::from_dom("Enter"), Key::Named("Enter".into()));
    }
}
