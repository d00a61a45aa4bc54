//! Two-step mention deletion.
//!
//! The first backspace right after a mention arms it (the surface marks it),
//! the second one deletes it. Any other edit or a caret move away disarms.
//! The transition function is pure; the controller applies its effects.

use crate::surface::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MentionDeleteState {
    #[default]
    Idle,
    /// The mention at this offset is marked and will go on the next backspace.
    Armed(usize),
}

impl MentionDeleteState {
    pub fn armed_index(self) -> Option<usize> {
        match self {
            Self::Armed(index) => Some(index),
            Self::Idle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionEvent {
    Backspace {
        selection: Option<Selection>,
        /// Whether a mention sits directly before a collapsed selection.
        embed_before: bool,
    },
    SelectionChanged(Option<Selection>),
    ContentChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionEffect {
    None,
    /// Let the host run its default backspace.
    PassThrough,
    /// Mark the mention at this offset and consume the key.
    Arm(usize),
    /// Delete the mention at this offset and consume the key.
    Delete(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: MentionDeleteState,
    pub effect: MentionEffect,
    /// Previously armed offset whose mark must be cleared.
    pub disarmed: Option<usize>,
}

impl Transition {
    fn idle(state: MentionDeleteState, effect: MentionEffect) -> Self {
        Self {
            next: MentionDeleteState::Idle,
            effect,
            disarmed: state.armed_index(),
        }
    }
}

pub fn transition(state: MentionDeleteState, event: MentionEvent) -> Transition {
    let result = match event {
        MentionEvent::Backspace {
            selection: Some(selection),
            embed_before: true,
        } if selection.is_collapsed() && selection.index > 0 => {
            let target = selection.index - 1;
            if state == MentionDeleteState::Armed(target) {
                Transition {
                    next: MentionDeleteState::Idle,
                    effect: MentionEffect::Delete(target),
                    disarmed: None,
                }
            } else {
                Transition {
                    next: MentionDeleteState::Armed(target),
                    effect: MentionEffect::Arm(target),
                    disarmed: state.armed_index(),
                }
            }
        }
        MentionEvent::Backspace { .. } => Transition::idle(state, MentionEffect::PassThrough),
        MentionEvent::SelectionChanged(selection) => match state {
            MentionDeleteState::Armed(index)
                if selection == Some(Selection::caret(index + 1)) =>
            {
                Transition {
                    next: state,
                    effect: MentionEffect::None,
                    disarmed: None,
                }
            }
            _ => Transition::idle(state, MentionEffect::None),
        },
        MentionEvent::ContentChanged => Transition::idle(state, MentionEffect::None),
    };

    if result.next != state {
        tracing::trace!(from = ?state, to = ?result.next, ?event, "mention delete transition");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backspace_at(index: usize, embed_before: bool) -> MentionEvent {
        MentionEvent::Backspace {
            selection: Some(Selection::caret(index)),
            embed_before,
        }
    }

    #[test]
    fn test_first_backspace_arms() {
        let t = transition(MentionDeleteState::Idle, backspace_at(4, true));
        assert_eq!(t.next, MentionDeleteState::Armed(3));
        assert_eq!(t.effect, MentionEffect::Arm(3));
        assert_eq!(t.disarmed, None);
    }

    #[test]
    fn test_second_backspace_deletes() {
        let t = transition(MentionDeleteState::Armed(3), backspace_at(4, true));
        assert_eq!(t.next, MentionDeleteState::Idle);
        assert_eq!(t.effect, MentionEffect::Delete(3));
    }

    #[test]
    fn test_arming_another_mention_disarms_the_first() {
        let t = transition(MentionDeleteState::Armed(7), backspace_at(4, true));
        assert_eq!(t.next, MentionDeleteState::Armed(3));
        assert_eq!(t.disarmed, Some(7));
    }

    #[test]
    fn test_backspace_without_mention_passes_through() {
        let t = transition(MentionDeleteState::Armed(3), backspace_at(9, false));
        assert_eq!(t.next, MentionDeleteState::Idle);
        assert_eq!(t.effect, MentionEffect::PassThrough);
        assert_eq!(t.disarmed, Some(3));
    }

    #[test]
    fn test_backspace_with_range_selection_passes_through() {
        let event = MentionEvent::Backspace {
            selection: Some(Selection::new(2, 3)),
            embed_before: true,
        };
        let t = transition(MentionDeleteState::Idle, event);
        assert_eq!(t.effect, MentionEffect::PassThrough);
    }

    #[test]
    fn test_backspace_at_start_passes_through() {
        let t = transition(MentionDeleteState::Idle, backspace_at(0, true));
        assert_eq!(t.effect, MentionEffect::PassThrough);
    }

    #[test]
    fn test_selection_staying_put_keeps_armed() {
        let state = MentionDeleteState::Armed(3);
        let t = transition(state, MentionEvent::SelectionChanged(Some(Selection::caret(4))));
        assert_eq!(t.next, state);
        assert_eq!(t.disarmed, None);
    }

    #[test]
    fn test_selection_moving_disarms() {
        let state = MentionDeleteState::Armed(3);
        for selection in [None, Some(Selection::caret(2)), Some(Selection::new(4, 1))] {
            let t = transition(state, MentionEvent::SelectionChanged(selection));
            assert_eq!(t.next, MentionDeleteState::Idle);
            assert_eq!(t.disarmed, Some(3));
        }
    }

    #[test]
    fn test_content_change_always_disarms() {
        let t = transition(MentionDeleteState::Armed(3), MentionEvent::ContentChanged);
        assert_eq!(t.next, MentionDeleteState::Idle);
        assert_eq!(t.disarmed, Some(3));
        let t = transition(MentionDeleteState::Idle, MentionEvent::ContentChanged);
        assert_eq!(t.disarmed, None);
    }
}
