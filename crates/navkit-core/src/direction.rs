#![forbid(unsafe_code)]

//! Four-way navigation direction.

use crate::event::{KeyCode, KeyEvent, KeyEventKind};

/// Direction of a directional focus move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Recognize an arrow key press.
    ///
    /// Keys held with any modifier, releases, and non-arrow keys are not
    /// directional input and yield `None`.
    #[must_use]
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if !key.is_unmodified() || key.kind == KeyEventKind::Release {
            return None;
        }
        match key.code {
            KeyCode::Up => Some(Direction::Up),
            KeyCode::Down => Some(Direction::Down),
            KeyCode::Left => Some(Direction::Left),
            KeyCode::Right => Some(Direction::Right),
            _ => None,
        }
    }

    /// Whether moving this way advances through tab order.
    ///
    /// Down and Right are forward; Up and Left are backward.
    #[inline]
    #[must_use]
    pub const fn is_forward(self) -> bool {
        matches!(self, Direction::Down | Direction::Right)
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::event::Modifiers;
    use proptest::prelude::*;

    fn key_code() -> impl Strategy<Value = KeyCode> {
        prop_oneof![
            Just(KeyCode::Up),
            Just(KeyCode::Down),
            Just(KeyCode::Left),
            Just(KeyCode::Right),
            Just(KeyCode::Enter),
            Just(KeyCode::Tab),
            any::<char>().prop_map(KeyCode::Char),
        ]
    }

    proptest! {
        #[test]
        fn modified_keys_are_never_directional(code in key_code(), bits in 1u8..16) {
            let key = KeyEvent::new(code).with_modifiers(Modifiers::from_bits_truncate(bits));
            prop_assert_eq!(Direction::from_key(&key), None);
        }

        #[test]
        fn opposite_flips_sense(idx in 0usize..4) {
            let dir = Direction::ALL[idx];
            prop_assert_eq!(dir.opposite().opposite(), dir);
            prop_assert_ne!(dir.opposite().is_forward(), dir.is_forward());
        }
    }
}
