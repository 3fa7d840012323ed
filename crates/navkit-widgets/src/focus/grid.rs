#![forbid(unsafe_code)]

//! Directional override table for focus navigation.
//!
//! Each entry says "moving `direction` from `source` lands on `target`".
//! A `None` source is the initial-focus entry: where a directional key lands
//! when nothing is focused yet.
//!
//! The grid is authored ahead of time by the surrounding layout. The router
//! only ever reads it.
//!
//! # Invariants
//!
//! 1. At most one target per `(source, direction)` key; re-setting overwrites.
//! 2. [`FocusGrid::forget_element`] removes every entry whose source or
//!    target is the forgotten element.
//!
//! # Complexity
//!
//! | Operation | Time |
//! |-----------|------|
//! | set | O(1) |
//! | lookup | O(1) |
//! | forget_element | O(E) |
//! | validate | O(E) |

use std::collections::HashMap;
use std::fmt;

use navkit_core::Direction;

use super::tree::{ElementId, ElementTree};

/// One authored override: `(source, direction, target)`.
pub type GridEntry = (Option<ElementId>, Direction, ElementId);

/// Sparse directional override table.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FocusGrid {
    entries: HashMap<(Option<ElementId>, Direction), ElementId>,
}

impl FocusGrid {
    /// Create an empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid from authored triples. Later triples win on conflicts.
    #[must_use]
    pub fn from_triples(triples: impl IntoIterator<Item = GridEntry>) -> Self {
        let mut grid = Self::new();
        grid.extend(triples);
        grid
    }

    /// Add authored triples.
    pub fn extend(&mut self, triples: impl IntoIterator<Item = GridEntry>) {
        for (source, dir, target) in triples {
            self.insert(source, dir, target);
        }
    }

    /// Set an override. Returns the target it replaced, if any.
    pub fn insert(
        &mut self,
        source: Option<ElementId>,
        dir: Direction,
        target: ElementId,
    ) -> Option<ElementId> {
        self.entries.insert((source, dir), target)
    }

    /// Moving `dir` from `source` lands on `target`.
    pub fn set(&mut self, source: ElementId, dir: Direction, target: ElementId) -> Option<ElementId> {
        self.insert(Some(source), dir, target)
    }

    /// With nothing focused, moving `dir` lands on `target`.
    pub fn set_initial(&mut self, dir: Direction, target: ElementId) -> Option<ElementId> {
        self.insert(None, dir, target)
    }

    /// Remove an override.
    pub fn remove(&mut self, source: Option<ElementId>, dir: Direction) -> Option<ElementId> {
        self.entries.remove(&(source, dir))
    }

    /// Look up the override for `(source, dir)`.
    #[must_use = "use the returned target id (if any)"]
    pub fn lookup(&self, source: Option<ElementId>, dir: Direction) -> Option<ElementId> {
        self.entries.get(&(source, dir)).copied()
    }

    /// Remove every entry that starts or ends at `id`.
    ///
    /// Returns the number of entries removed.
    pub fn forget_element(&mut self, id: ElementId) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|(source, _), target| *source != Some(id) && *target != id);
        before - self.entries.len()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = GridEntry> + '_ {
        self.entries
            .iter()
            .map(|((source, dir), target)| (*source, *dir, *target))
    }

    /// Clear all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Check every entry against `tree` and report all problems.
    ///
    /// Sources must exist; targets must exist and be focusable or list-like.
    pub fn validate<T: ElementTree + ?Sized>(&self, tree: &T) -> Result<(), Vec<GridError>> {
        let mut errors = Vec::new();
        for (source, direction, target) in self.entries() {
            if let Some(source) = source
                && !tree.contains(source)
            {
                errors.push(GridError::UnknownSource { source, direction });
            }
            if !tree.contains(target) {
                errors.push(GridError::UnknownTarget { target, direction });
            } else if !tree.is_focusable(target) && !tree.is_list_container(target) {
                errors.push(GridError::UnfocusableTarget { target });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Problem found by [`FocusGrid::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    UnknownSource {
        source: ElementId,
        direction: Direction,
    },
    UnknownTarget {
        target: ElementId,
        direction: Direction,
    },
    UnfocusableTarget {
        target: ElementId,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSource { source, direction } => {
                write!(f, "grid source {source} ({direction:?}) is not in the tree")
            }
            Self::UnknownTarget { target, direction } => {
                write!(f, "grid target {target} ({direction:?}) is not in the tree")
            }
            Self::UnfocusableTarget { target } => {
                write!(f, "grid target {target} can never receive focus")
            }
        }
    }
}

impl std::error::Error for GridError {}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::focus::tree::{ElementNode, Scene};

    #[test]
    fn empty_grid() {
        let g = FocusGrid::new();
        assert!(g.is_empty());
        assert_eq!(g.len(), 0);
        assert_eq!(g.lookup(None, Direction::Down), None);
    }

    #[test]
    fn set_and_lookup() {
        let mut g = FocusGrid::new();
        g.set(1, Direction::Down, 2);
        assert_eq!(g.lookup(Some(1), Direction::Down), Some(2));
        assert_eq!(g.lookup(Some(1), Direction::Up), None);
        assert_eq!(g.lookup(Some(2), Direction::Down), None);
    }

    #[test]
    fn initial_entry_is_separate_from_sources() {
        let mut g = FocusGrid::new();
        g.set_initial(Direction::Down, 7);
        g.set(7, Direction::Down, 8);
        assert_eq!(g.lookup(None, Direction::Down), Some(7));
        assert_eq!(g.lookup(Some(7), Direction::Down), Some(8));
    }

    #[test]
    fn overwrite_returns_previous() {
        let mut g = FocusGrid::new();
        assert_eq!(g.set(1, Direction::Right, 2), None);
        assert_eq!(g.set(1, Direction::Right, 3), Some(2));
        assert_eq!(g.lookup(Some(1), Direction::Right), Some(3));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn from_triples_later_wins() {
        let g = FocusGrid::from_triples([
            (Some(1), Direction::Down, 2),
            (None, Direction::Down, 1),
            (Some(1), Direction::Down, 3),
        ]);
        assert_eq!(g.len(), 2);
        assert_eq!(g.lookup(Some(1), Direction::Down), Some(3));
    }

    #[test]
    fn remove_entry() {
        let mut g = FocusGrid::from_triples([(Some(1), Direction::Left, 2)]);
        assert_eq!(g.remove(Some(1), Direction::Left), Some(2));
        assert!(g.is_empty());
        assert_eq!(g.remove(Some(1), Direction::Left), None);
    }

    #[test]
    fn forget_element_cleans_both_ends() {
        let mut g = FocusGrid::from_triples([
            (Some(1), Direction::Down, 2),
            (Some(2), Direction::Down, 3),
            (None, Direction::Down, 2),
            (Some(3), Direction::Up, 1),
        ]);
        assert_eq!(g.forget_element(2), 3);
        assert_eq!(g.len(), 1);
        assert_eq!(g.lookup(Some(3), Direction::Up), Some(1));
    }

    #[test]
    fn entries_round_trip_through_from_triples() {
        let g = FocusGrid::from_triples([
            (Some(1), Direction::Down, 2),
            (None, Direction::Right, 5),
        ]);
        let rebuilt = FocusGrid::from_triples(g.entries());
        assert_eq!(rebuilt, g);
    }

    #[test]
    fn clear_empties_grid() {
        let mut g = FocusGrid::from_triples([(Some(1), Direction::Down, 2)]);
        g.clear();
        assert!(g.is_empty());
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut scene = Scene::new();
        scene.insert_root(ElementNode::scope(1)).unwrap();
        scene.insert(1, ElementNode::control(2)).unwrap();
        scene.insert(1, ElementNode::panel(3)).unwrap();
        scene.insert(1, ElementNode::list(4).with_focusable(false)).unwrap();

        let ok = FocusGrid::from_triples([
            (None, Direction::Down, 2),
            (Some(2), Direction::Down, 4),
        ]);
        assert_eq!(ok.validate(&scene), Ok(()));

        let bad = FocusGrid::from_triples([
            (Some(99), Direction::Down, 2),
            (Some(2), Direction::Up, 98),
            (Some(2), Direction::Right, 3),
        ]);
        let errors = bad.validate(&scene).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&GridError::UnknownSource {
            source: 99,
            direction: Direction::Down
        }));
        assert!(errors.contains(&GridError::UnknownTarget {
            target: 98,
            direction: Direction::Up
        }));
        assert!(errors.contains(&GridError::UnfocusableTarget { target: 3 }));
    }

    #[test]
    fn grid_error_display() {
        let err = GridError::UnfocusableTarget { target: 3 };
        assert_eq!(err.to_string(), "grid target 3 can never receive focus");
    }

    #[test]
    fn perf_lookup_10000() {
        let mut g = FocusGrid::new();
        for i in 0..100u64 {
            g.set(i, Direction::Down, (i + 1) % 100);
        }

        let start = std::time::Instant::now();
        let mut current = 0;
        for _ in 0..10_000 {
            current = g.lookup(Some(current), Direction::Down).unwrap();
        }
        let elapsed = start.elapsed();
        assert!(current < 100);
        assert!(
            elapsed.as_micros() < 8_000,
            "10,000 lookups took {}μs (budget: 8000μs)",
            elapsed.as_micros()
        );
    }
}
