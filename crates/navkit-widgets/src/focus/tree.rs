#![forbid(unsafe_code)]

//! Element tree capabilities consumed by the focus router.
//!
//! The router never inspects concrete widget types. Everything it needs to
//! know about the surrounding scene goes through [`ElementTree`]: structure
//! (parent/children), whether an element can take focus, whether it is a
//! navigable scope (a screen that remembers its last focused child), and
//! whether it is a list-like container whose items are realized on demand.
//!
//! [`Scene`] is the in-memory implementation used by hosts that do not
//! already own a retained tree, and by the tests.
//!
//! # Invariants
//!
//! 1. Element IDs are unique within a scene.
//! 2. Parent chains are acyclic and end at the root.
//! 3. `children()` returns elements in their natural (tab) order.
//! 4. `realized_items()` is a subsequence of `children()`.

use std::collections::HashMap;
use std::fmt;

/// Unique identifier for an element in the scene.
pub type ElementId = u64;

/// What role an element plays for focus resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Interactive leaf such as a button or text field.
    #[default]
    Control,
    /// Plain layout container.
    Panel,
    /// Navigable container (a screen) owning a focus-memory slot.
    Scope,
    /// Virtualized list; only realized items can receive focus.
    List,
}

/// An element in a [`Scene`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementNode {
    pub id: ElementId,
    pub kind: ElementKind,
    /// Whether this element can receive focus.
    pub is_focusable: bool,
    /// Whether this element is currently materialized by its list.
    pub is_realized: bool,
}

impl ElementNode {
    /// Create an element of the given kind with kind-appropriate defaults.
    ///
    /// Controls and lists are focusable; panels and scopes are not.
    #[must_use]
    pub fn new(id: ElementId, kind: ElementKind) -> Self {
        Self {
            id,
            kind,
            is_focusable: matches!(kind, ElementKind::Control | ElementKind::List),
            is_realized: true,
        }
    }

    #[must_use]
    pub fn control(id: ElementId) -> Self {
        Self::new(id, ElementKind::Control)
    }

    #[must_use]
    pub fn panel(id: ElementId) -> Self {
        Self::new(id, ElementKind::Panel)
    }

    #[must_use]
    pub fn scope(id: ElementId) -> Self {
        Self::new(id, ElementKind::Scope)
    }

    #[must_use]
    pub fn list(id: ElementId) -> Self {
        Self::new(id, ElementKind::List)
    }

    /// Builder: set focusable flag.
    #[must_use]
    pub fn with_focusable(mut self, focusable: bool) -> Self {
        self.is_focusable = focusable;
        self
    }

    /// Builder: set realized flag.
    #[must_use]
    pub fn with_realized(mut self, realized: bool) -> Self {
        self.is_realized = realized;
        self
    }
}

/// Capability interface the focus router resolves against.
pub trait ElementTree {
    /// Topmost element, used as the active scope until one is activated.
    fn root(&self) -> Option<ElementId>;

    fn contains(&self, id: ElementId) -> bool;

    fn parent(&self, id: ElementId) -> Option<ElementId>;

    /// Children in natural order.
    fn children(&self, id: ElementId) -> Vec<ElementId>;

    fn is_focusable(&self, id: ElementId) -> bool;

    /// Whether the element is a navigable scope with its own focus memory.
    fn is_scope(&self, id: ElementId) -> bool;

    /// Whether the element is a list-like container.
    fn is_list_container(&self, id: ElementId) -> bool;

    /// Realized, focusable items of a list-like container, in order.
    fn realized_items(&self, id: ElementId) -> Vec<ElementId>;

    /// Scroll the element into view. Default: nothing to scroll.
    fn bring_into_view(&mut self, _id: ElementId) {}

    /// Whether `id` is `ancestor` or lies below it.
    fn is_within(&self, id: ElementId, ancestor: ElementId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Nearest list-like container strictly above `id`.
    fn enclosing_list(&self, id: ElementId) -> Option<ElementId> {
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if self.is_list_container(current) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Every scope strictly above `id`, innermost first.
    fn enclosing_scopes(&self, id: ElementId) -> Vec<ElementId> {
        let mut scopes = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(current) = cursor {
            if self.is_scope(current) {
                scopes.push(current);
            }
            cursor = self.parent(current);
        }
        scopes
    }
}

/// Errors from scene authoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// An element with this ID already exists.
    DuplicateElement(ElementId),
    /// The named parent does not exist.
    UnknownParent(ElementId),
    /// The named element does not exist.
    UnknownElement(ElementId),
    /// The scene already has a root.
    RootAlreadySet(ElementId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateElement(id) => write!(f, "element {id} already exists"),
            Self::UnknownParent(id) => write!(f, "parent element {id} does not exist"),
            Self::UnknownElement(id) => write!(f, "element {id} does not exist"),
            Self::RootAlreadySet(id) => write!(f, "scene already has root {id}"),
        }
    }
}

impl std::error::Error for SceneError {}

#[derive(Debug, Clone)]
struct SceneEntry {
    node: ElementNode,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// In-memory element tree.
#[derive(Debug, Default)]
pub struct Scene {
    entries: HashMap<ElementId, SceneEntry>,
    root: Option<ElementId>,
    /// Elements scrolled into view, oldest first.
    scrolled: Vec<ElementId>,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the root element.
    pub fn insert_root(&mut self, node: ElementNode) -> Result<ElementId, SceneError> {
        if let Some(root) = self.root {
            return Err(SceneError::RootAlreadySet(root));
        }
        let id = self.insert_entry(node, None)?;
        self.root = Some(id);
        Ok(id)
    }

    /// Append `node` as the last child of `parent`.
    pub fn insert(&mut self, parent: ElementId, node: ElementNode) -> Result<ElementId, SceneError> {
        if !self.entries.contains_key(&parent) {
            return Err(SceneError::UnknownParent(parent));
        }
        let id = self.insert_entry(node, Some(parent))?;
        if let Some(entry) = self.entries.get_mut(&parent) {
            entry.children.push(id);
        }
        Ok(id)
    }

    fn insert_entry(&mut self, node: ElementNode, parent: Option<ElementId>) -> Result<ElementId, SceneError> {
        let id = node.id;
        if self.entries.contains_key(&id) {
            return Err(SceneError::DuplicateElement(id));
        }
        self.entries.insert(
            id,
            SceneEntry {
                node,
                parent,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Remove an element and its whole subtree.
    ///
    /// Returns the removed element, or `None` if not present.
    #[must_use = "use the removed node (if any)"]
    pub fn remove(&mut self, id: ElementId) -> Option<ElementNode> {
        let entry = self.entries.remove(&id)?;
        if let Some(parent) = entry.parent
            && let Some(parent_entry) = self.entries.get_mut(&parent)
        {
            parent_entry.children.retain(|child| *child != id);
        }
        if self.root == Some(id) {
            self.root = None;
        }

        let mut pending = entry.children;
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.entries.remove(&child) {
                pending.extend(removed.children);
            }
        }
        Some(entry.node)
    }

    /// Look up an element by ID.
    #[must_use = "use the returned node (if any)"]
    pub fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.entries.get(&id).map(|entry| &entry.node)
    }

    /// Mark a list item as realized or recycled.
    pub fn set_realized(&mut self, id: ElementId, realized: bool) -> Result<(), SceneError> {
        let entry = self.entries.get_mut(&id).ok_or(SceneError::UnknownElement(id))?;
        entry.node.is_realized = realized;
        Ok(())
    }

    pub fn set_focusable(&mut self, id: ElementId, focusable: bool) -> Result<(), SceneError> {
        let entry = self.entries.get_mut(&id).ok_or(SceneError::UnknownElement(id))?;
        entry.node.is_focusable = focusable;
        Ok(())
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take and clear the bring-into-view log.
    pub fn take_scrolled(&mut self) -> Vec<ElementId> {
        std::mem::take(&mut self.scrolled)
    }
}

impl ElementTree for Scene {
    fn root(&self) -> Option<ElementId> {
        self.root
    }

    fn contains(&self, id: ElementId) -> bool {
        self.entries.contains_key(&id)
    }

    fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.entries.get(&id).and_then(|entry| entry.parent)
    }

    fn children(&self, id: ElementId) -> Vec<ElementId> {
        self.entries
            .get(&id)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn is_focusable(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|node| node.is_focusable)
    }

    fn is_scope(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|node| node.kind == ElementKind::Scope)
    }

    fn is_list_container(&self, id: ElementId) -> bool {
        self.get(id).is_some_and(|node| node.kind == ElementKind::List)
    }

    fn realized_items(&self, id: ElementId) -> Vec<ElementId> {
        let Some(entry) = self.entries.get(&id) else {
            return Vec::new();
        };
        if entry.node.kind != ElementKind::List {
            return Vec::new();
        }
        entry
            .children
            .iter()
            .copied()
            .filter(|child| {
                self.get(*child)
                    .is_some_and(|node| node.is_realized && node.is_focusable)
            })
            .collect()
    }

    fn bring_into_view(&mut self, id: ElementId) {
        self.scrolled.push(id);
    }
}
