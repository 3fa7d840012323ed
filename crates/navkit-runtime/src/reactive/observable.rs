#![forbid(unsafe_code)]

//! Observable value with change notification and version tracking.
//!
//! [`Observable<T>`] keeps its value in `Rc<RefCell<..>>` and compares with
//! `PartialEq` on every `set`. Callbacks run outside the borrow, so a
//! subscriber may call `set` again (the navigator's "current view" changes
//! while a close handler pushes a new view, for example).
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: the nested `set` notifies every subscriber with the
//!   newer value, and the outer notification pass stops early instead of
//!   delivering the stale one.
//! - **Subscriber leak**: guards held forever keep their callbacks alive.
//!   Dead weak references are pruned lazily on the next notification.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<T> = Rc<dyn Fn(&T)>;
type CallbackWeak<T> = Weak<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<CallbackWeak<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning creates another handle to the same value and subscriber list.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscriber_count", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an observable at version 0 with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Replace the value. Unequal values bump the version and notify
    /// subscribers in registration order.
    pub fn set(&self, value: T) {
        let version = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
            inner.version
        };
        self.notify(version);
    }

    /// Call `callback` with every new value until the guard is dropped.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Increments by 1 on each value-changing mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    fn notify(&self, version: u64) {
        let (callbacks, value): (Vec<CallbackRc<T>>, T) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (callbacks, inner.value.clone())
        };

        for cb in &callbacks {
            // A subscriber set a newer value; that pass has notified everyone.
            if self.inner.borrow().version != version {
                return;
            }
            cb(&value);
        }
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping it drops the only strong reference to the callback, so the
/// observable's weak entry stops upgrading.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_set_basic() {
        let obs = Observable::new(42);
        assert_eq!(obs.get(), 42);
        assert_eq!(obs.version(), 0);

        obs.set(99);
        assert_eq!(obs.get(), 99);
        assert_eq!(obs.version(), 1);
    }

    #[test]
    fn equal_value_is_noop() {
        let obs = Observable::new(Some(3u64));
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let _sub = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.set(Some(3));
        assert_eq!(obs.version(), 0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn subscription_drop_unsubscribes() {
        let obs = Observable::new(0);
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let sub = obs.subscribe(move |_| count_clone.set(count_clone.get() + 1));

        obs.set(1);
        drop(sub);
        obs.set(2);
        assert_eq!(count.get(), 1);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn notification_order_is_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = obs.subscribe(move |_| log1.borrow_mut().push('A'));
        let log2 = Rc::clone(&log);
        let _s2 = obs.subscribe(move |_| log2.borrow_mut().push('B'));

        obs.set(1);
        assert_eq!(*log.borrow(), vec!['A', 'B']);
    }

    #[test]
    fn clone_shares_state_and_subscribers() {
        let obs1 = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let seen_clone = Rc::clone(&seen);
        let _sub = obs1.subscribe(move |v| seen_clone.set(*v));

        let obs2 = obs1.clone();
        obs2.set(7);
        assert_eq!(obs1.get(), 7);
        assert_eq!(seen.get(), 7);
    }

    #[test]
    fn reentrant_set_from_subscriber() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));

        let handle = obs.clone();
        let log1 = Rc::clone(&log);
        let _s1 = obs.subscribe(move |v| {
            log1.borrow_mut().push(('A', *v));
            if *v == 1 {
                handle.set(2);
            }
        });
        let log2 = Rc::clone(&log);
        let _s2 = obs.subscribe(move |v| log2.borrow_mut().push(('B', *v)));

        obs.set(1);
        assert_eq!(obs.get(), 2);
        assert_eq!(obs.version(), 2);
        // B never sees the superseded value 1.
        assert_eq!(*log.borrow(), vec![('A', 1), ('A', 2), ('B', 2)]);
    }

    #[test]
    fn subscribe_from_subscriber() {
        let obs = Observable::new(0);
        let late: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let late_hits = Rc::new(Cell::new(0u32));

        let handle = obs.clone();
        let late_slot = Rc::clone(&late);
        let hits = Rc::clone(&late_hits);
        let _sub = obs.subscribe(move |_| {
            if late_slot.borrow().is_none() {
                let hits = Rc::clone(&hits);
                *late_slot.borrow_mut() =
                    Some(handle.subscribe(move |_| hits.set(hits.get() + 1)));
            }
        });

        obs.set(1);
        assert_eq!(late_hits.get(), 0);
        obs.set(2);
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", Observable::new(42));
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
        assert!(dbg.contains("version"));
    }
}
