#![forbid(unsafe_code)]

//! Default (tab-order) traversal used when the grid has no override.
//!
//! Tab order is a pre-order walk of a scope's descendants in child order.
//! Every focusable element is a stop. A list-like container is a single stop
//! and its items are not walked: arriving on it is resolved to a realized
//! item by the router.

use super::tree::{ElementId, ElementTree};

/// Stops below `scope`, in tab order. The scope itself is never a stop.
pub fn tab_order<T: ElementTree + ?Sized>(tree: &T, scope: ElementId) -> Vec<ElementId> {
    let mut order = Vec::new();
    let mut pending: Vec<ElementId> = tree.children(scope).into_iter().rev().collect();

    while let Some(id) = pending.pop() {
        if tree.is_list_container(id) {
            if tree.is_focusable(id) || !tree.realized_items(id).is_empty() {
                order.push(id);
            }
            continue;
        }
        if tree.is_focusable(id) {
            order.push(id);
        }
        pending.extend(tree.children(id).into_iter().rev());
    }

    order
}

/// First stop in `scope`.
#[must_use]
pub fn first_stop<T: ElementTree + ?Sized>(tree: &T, scope: ElementId) -> Option<ElementId> {
    tab_order(tree, scope).first().copied()
}

/// Step one stop forward or backward from `from` within `scope`.
///
/// If `from` is not a stop of the scope, stepping starts from the scope's
/// edge: the first stop going forward, the last going backward. Without
/// `wrap`, stepping past either end yields `None`.
#[must_use]
pub fn step<T: ElementTree + ?Sized>(
    tree: &T,
    scope: ElementId,
    from: ElementId,
    forward: bool,
    wrap: bool,
) -> Option<ElementId> {
    let order = tab_order(tree, scope);
    let last = order.len().checked_sub(1)?;

    let Some(idx) = order.iter().position(|id| *id == from) else {
        return if forward {
            order.first().copied()
        } else {
            order.last().copied()
        };
    };

    let next = if forward {
        if idx < last {
            idx + 1
        } else if wrap {
            0
        } else {
            return None;
        }
    } else if idx > 0 {
        idx - 1
    } else if wrap {
        last
    } else {
        return None;
    };

    Some(order[next])
}
