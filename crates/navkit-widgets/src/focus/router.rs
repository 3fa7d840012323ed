#![forbid(unsafe_code)]

//! Focus router: turns arrow keys into focus moves.
//!
//! Resolution for a directional key, given the focused element (if any):
//!
//! 1. An element inside a list-like container is looked up as the container,
//!    unless the grid has a usable entry keyed on the element itself.
//! 2. The grid override for `(key, direction)` wins. With nothing focused the
//!    key is `None` (initial focus).
//! 3. Otherwise default traversal over the active scope: Down/Right step
//!    forward, Up/Left step backward. With nothing focused, the first stop.
//! 4. A list-like target becomes its first realized item when entered
//!    forward (Down/Right/initial) or its last when entered backward.
//! 5. The target is scrolled into view, focused, and remembered by every
//!    enclosing scope.
//!
//! # Failure Modes
//!
//! - Dead end (no override, traversal exhausted): focus unchanged, the key
//!   still counts as handled.
//! - Grid targets that left the tree, cannot take focus, or sit outside the
//!   active scope are ignored as if the entry did not exist.
//! - A remembered child that is no longer valid is forgotten on activation
//!   and initial resolution runs instead.

use navkit_core::Direction;
use navkit_core::event::KeyEvent;

use super::config::RouterConfig;
use super::grid::FocusGrid;
use super::memory::FocusMemory;
use super::traversal;
use super::tree::{ElementId, ElementTree};

/// Focus change events emitted by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    FocusGained { id: ElementId },
    FocusLost { id: ElementId },
    FocusMoved { from: ElementId, to: ElementId },
}

/// What happened to a key offered to the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not directional input; let it bubble.
    Ignored,
    /// Focus moved to the element.
    Moved(ElementId),
    /// Directional input with nowhere to go.
    DeadEnd,
}

impl KeyOutcome {
    /// Whether the host should mark the key event handled.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}

/// Directional focus coordinator over an element tree and an authored grid.
#[derive(Debug)]
pub struct FocusRouter<T: ElementTree> {
    tree: T,
    grid: FocusGrid,
    memory: FocusMemory,
    current: Option<ElementId>,
    active_scope: Option<ElementId>,
    last_event: Option<FocusEvent>,
    config: RouterConfig,
}

impl<T: ElementTree> FocusRouter<T> {
    /// Create a router with default configuration.
    #[must_use]
    pub fn new(tree: T, grid: FocusGrid) -> Self {
        Self {
            tree,
            grid,
            memory: FocusMemory::new(),
            current: None,
            active_scope: None,
            last_event: None,
            config: RouterConfig::default(),
        }
    }

    /// Builder: replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> RouterConfig {
        self.config
    }

    #[must_use]
    pub fn tree(&self) -> &T {
        &self.tree
    }

    /// Mutably access the element tree (layout changes, realization).
    pub fn tree_mut(&mut self) -> &mut T {
        &mut self.tree
    }

    #[must_use]
    pub fn grid(&self) -> &FocusGrid {
        &self.grid
    }

    /// Authoring access to the grid. The router itself never writes it.
    pub fn grid_mut(&mut self) -> &mut FocusGrid {
        &mut self.grid
    }

    #[must_use]
    pub fn memory(&self) -> &FocusMemory {
        &self.memory
    }

    /// Currently focused element.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<ElementId> {
        self.current
    }

    /// Scope that default traversal runs over: the last activated one, or
    /// the tree root.
    #[must_use]
    pub fn active_scope(&self) -> Option<ElementId> {
        self.active_scope
            .filter(|scope| self.tree.contains(*scope))
            .or_else(|| self.tree.root())
    }

    /// Offer a key event.
    ///
    /// Only unmodified arrow presses are routed; everything else is
    /// [`KeyOutcome::Ignored`].
    pub fn handle_key(&mut self, key: &KeyEvent) -> KeyOutcome {
        match Direction::from_key(key) {
            Some(dir) => self.handle_directional_key(dir),
            None => KeyOutcome::Ignored,
        }
    }

    /// Move focus one step in `dir`.
    pub fn handle_directional_key(&mut self, dir: Direction) -> KeyOutcome {
        let Some(target) = self.resolve_from(self.current, dir) else {
            navkit_core::debug!(?dir, current = ?self.current, "focus dead end");
            return KeyOutcome::DeadEnd;
        };
        if self.set_focus(target) {
            KeyOutcome::Moved(target)
        } else {
            KeyOutcome::DeadEnd
        }
    }

    /// Where `dir` would move focus from the current element, without moving.
    #[must_use]
    pub fn resolve(&self, dir: Direction) -> Option<ElementId> {
        self.resolve_from(self.current, dir)
    }

    /// Where `dir` would move focus from `from` (`None` = nothing focused).
    #[must_use]
    pub fn resolve_from(&self, from: Option<ElementId>, dir: Direction) -> Option<ElementId> {
        let scope = self.active_scope()?;
        let Some(focused) = from.filter(|id| self.tree.contains(*id)) else {
            return self.resolve_initial(scope, dir);
        };

        // Items inside a list move as the list, except for their own usable
        // grid entries.
        let anchor = self.tree.enclosing_list(focused).unwrap_or(focused);
        let target = self
            .grid_target(Some(focused), dir, scope)
            .or_else(|| {
                (anchor != focused)
                    .then(|| self.grid_target(Some(anchor), dir, scope))
                    .flatten()
            })
            .or_else(|| traversal::step(&self.tree, scope, anchor, dir.is_forward(), self.config.wrap))?;
        self.enter(target, dir.is_forward())
    }

    /// A scope became active (screen shown or re-entered).
    ///
    /// Restores the scope's remembered child, falling back to initial
    /// resolution. Returns whether something ends up focused in the scope.
    pub fn on_activated(&mut self, scope: ElementId) -> bool {
        if !self.tree.contains(scope) {
            navkit_core::warn!(scope, "activated scope is not in the tree");
            return false;
        }
        self.active_scope = Some(scope);

        let remembered = self.memory.get(scope);
        let restored = remembered.filter(|id| self.can_focus_within(*id, scope));
        if remembered.is_some() && restored.is_none() {
            self.memory.forget_scope(scope);
        }

        let Some(target) = restored.or_else(|| self.resolve_initial(scope, Direction::Down)) else {
            return false;
        };
        navkit_core::debug!(scope, target, restored = restored.is_some(), "scope activated");
        self.current == Some(target) || self.set_focus(target)
    }

    /// The host moved focus by other means (pointer, programmatic).
    ///
    /// Returns `false` if the element is unknown or cannot take focus.
    pub fn on_focus_changed(&mut self, element: ElementId) -> bool {
        if !self.tree.contains(element) || !self.tree.is_focusable(element) {
            return false;
        }
        if self.current != Some(element) {
            self.last_event = Some(match self.current {
                Some(from) => FocusEvent::FocusMoved { from, to: element },
                None => FocusEvent::FocusGained { id: element },
            });
            self.current = Some(element);
        }
        self.remember(element);
        true
    }

    /// Focus an element of the active scope.
    pub fn focus(&mut self, id: ElementId) -> bool {
        let Some(scope) = self.active_scope() else {
            return false;
        };
        self.can_focus_within(id, scope) && self.set_focus(id)
    }

    /// Remove focus from the current element.
    pub fn blur(&mut self) -> Option<ElementId> {
        let prev = self.current.take();
        if let Some(id) = prev {
            self.last_event = Some(FocusEvent::FocusLost { id });
        }
        prev
    }

    /// An element left the tree: drop it from focus state and memory.
    pub fn forget_element(&mut self, id: ElementId) {
        if self.current == Some(id) {
            self.blur();
        }
        self.memory.forget_element(id);
    }

    /// Get the last focus event.
    #[must_use]
    pub fn focus_event(&self) -> Option<&FocusEvent> {
        self.last_event.as_ref()
    }

    /// Take and clear the last focus event.
    pub fn take_focus_event(&mut self) -> Option<FocusEvent> {
        self.last_event.take()
    }

    fn resolve_initial(&self, scope: ElementId, dir: Direction) -> Option<ElementId> {
        let target = self
            .grid_target(None, dir, scope)
            .or_else(|| traversal::first_stop(&self.tree, scope))?;
        self.enter(target, true)
    }

    fn grid_target(&self, source: Option<ElementId>, dir: Direction, scope: ElementId) -> Option<ElementId> {
        let target = self.grid.lookup(source, dir)?;
        let usable = self.tree.contains(target)
            && self.tree.is_within(target, scope)
            && (self.tree.is_focusable(target) || self.tree.is_list_container(target));
        if !usable {
            navkit_core::trace!(?source, ?dir, target, "ignoring unusable grid target");
            return None;
        }
        Some(target)
    }

    /// Resolve a list-like target to a concrete realized item.
    fn enter(&self, mut target: ElementId, forward: bool) -> Option<ElementId> {
        while self.tree.is_list_container(target) {
            let items = self.tree.realized_items(target);
            let item = if forward { items.first() } else { items.last() };
            match item {
                Some(&item) => target = item,
                None => return self.tree.is_focusable(target).then_some(target),
            }
        }
        Some(target)
    }

    fn can_focus_within(&self, id: ElementId, scope: ElementId) -> bool {
        self.tree.contains(id) && self.tree.is_focusable(id) && self.tree.is_within(id, scope)
    }

    fn set_focus(&mut self, id: ElementId) -> bool {
        if !self.tree.is_focusable(id) || self.current == Some(id) {
            return false;
        }
        if self.config.bring_into_view {
            self.tree.bring_into_view(id);
        }

        self.last_event = Some(match self.current {
            Some(from) => FocusEvent::FocusMoved { from, to: id },
            None => FocusEvent::FocusGained { id },
        });
        self.current = Some(id);
        self.remember(id);
        true
    }

    fn remember(&mut self, id: ElementId) {
        for scope in self.tree.enclosing_scopes(id) {
            self.memory.record(scope, id);
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
