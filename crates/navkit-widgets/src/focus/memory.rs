#![forbid(unsafe_code)]

//! Last-focused-child memory per navigable scope.

use std::collections::HashMap;

use super::tree::ElementId;

/// One slot per scope, overwritten on every focus gain inside it.
#[derive(Debug, Default, Clone)]
pub struct FocusMemory {
    slots: HashMap<ElementId, ElementId>,
}

impl FocusMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `element` as the last focused child of `scope`.
    pub fn record(&mut self, scope: ElementId, element: ElementId) {
        self.slots.insert(scope, element);
    }

    /// Last focused child of `scope`.
    #[must_use]
    pub fn get(&self, scope: ElementId) -> Option<ElementId> {
        self.slots.get(&scope).copied()
    }

    /// Drop the slot for `scope`.
    pub fn forget_scope(&mut self, scope: ElementId) -> Option<ElementId> {
        self.slots.remove(&scope)
    }

    /// Drop every slot owned by or pointing at `element`.
    pub fn forget_element(&mut self, element: ElementId) {
        self.slots
            .retain(|scope, remembered| *scope != element && *remembered != element);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
