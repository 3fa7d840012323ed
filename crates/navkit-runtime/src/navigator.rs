#![forbid(unsafe_code)]

//! View stack with veto-able, top-down close cascades.
//!
//! The navigator owns the ordered stack of open [`View`]s. The top of the
//! stack is the *current* view and is published through an
//! [`Observable`], so hosts re-render on every structural change.
//!
//! # Invariants
//!
//! 1. Current is always the most recently pushed view that has not closed.
//! 2. Closes proceed strictly from the top down. A view is never asked to
//!    close while anything above it is still open.
//! 3. A veto stops a cascade where it is. Nothing is rolled back.
//! 4. At most one close cascade runs per navigator. Concurrent callers
//!    queue or are rejected, per [`ClosePolicy`].
//! 5. A view closing itself out of band is removed through the same closed
//!    notification; current changes only if it was on top.
//!
//! # Re-entrancy
//!
//! Closed handlers and current-view subscribers may call back into the
//! navigator (push a replacement view, start another close). Stack borrows
//! are never held across callbacks or awaits, and cascades re-read the top
//! of the stack on every step.
//!
//! # Failure Modes
//!
//! - Pushing a view that is already stacked or already closed is rejected
//!   with a [`NavigationError`].
//! - A closed notification for a view the navigator does not own is a
//!   collaborator bug and panics.
//! - Load failures are logged at `warn` and never surfaced here.

use std::cell::RefCell;
use std::env;
use std::fmt;
use std::rc::{Rc, Weak};

use futures::lock::{Mutex, MutexGuard};
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};
use navkit_core::config::{ConfigError, ConfigParse};

use crate::reactive::{Observable, Subscription};
use crate::view::{ClosedSubscription, View, ViewId};

pub const ENV_CLOSE_POLICY: &str = "NAVKIT_CLOSE_POLICY";

/// What a close request does while another cascade is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClosePolicy {
    /// Wait for the running cascade, then run.
    #[default]
    Queue,
    /// Fail immediately with [`NavigationError::CloseInProgress`].
    Reject,
}

impl ClosePolicy {
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "queue" => Some(Self::Queue),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queue => "queue",
            Self::Reject => "reject",
        }
    }
}

/// Navigator configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigatorConfig {
    pub close_policy: ClosePolicy,
}

impl NavigatorConfig {
    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse<Self> {
        from_env_with(|key| env::var(key).ok())
    }

    #[must_use]
    pub fn with_close_policy(mut self, policy: ClosePolicy) -> Self {
        self.close_policy = policy;
        self
    }
}

fn from_env_with<F>(mut get: F) -> ConfigParse<NavigatorConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = NavigatorConfig::default();
    let mut errors = Vec::new();
    if let Some(value) = get(ENV_CLOSE_POLICY) {
        match ClosePolicy::parse(&value) {
            Some(policy) => config.close_policy = policy,
            None => errors.push(ConfigError::new(
                "close_policy",
                value,
                "expected queue|reject",
            )),
        }
    }
    ConfigParse { config, errors }
}

/// Navigation contract violations and scheduling failures.
#[derive(Debug)]
pub enum NavigationError {
    /// The view is already on this navigator's stack.
    AlreadyInStack(ViewId),
    /// The view has closed and cannot be shown again.
    ViewClosed(ViewId),
    /// Another close cascade is running and the policy is `Reject`.
    CloseInProgress,
    /// The executor refused the view's load task.
    Spawn(SpawnError),
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyInStack(id) => write!(f, "{id} is already on the navigation stack"),
            Self::ViewClosed(id) => write!(f, "{id} is closed and cannot be reopened"),
            Self::CloseInProgress => write!(f, "a close cascade is already in progress"),
            Self::Spawn(err) => write!(f, "failed to spawn view load: {err}"),
        }
    }
}

impl std::error::Error for NavigationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

struct StackEntry {
    view: View,
    _closed: ClosedSubscription,
}

struct NavigatorInner {
    entries: RefCell<Vec<StackEntry>>,
    current: Observable<Option<ViewId>>,
    spawner: Rc<dyn LocalSpawn>,
    close_lock: Mutex<()>,
    config: NavigatorConfig,
}

/// Owner of the ordered stack of open views.
///
/// Cloning yields another handle to the same stack.
#[derive(Clone)]
pub struct Navigator {
    inner: Rc<NavigatorInner>,
}

impl Navigator {
    /// Create a navigator whose view loads run on `spawner`.
    pub fn new(spawner: impl LocalSpawn + 'static) -> Self {
        Self::with_config(spawner, NavigatorConfig::default())
    }

    pub fn with_config(spawner: impl LocalSpawn + 'static, config: NavigatorConfig) -> Self {
        Self {
            inner: Rc::new(NavigatorInner {
                entries: RefCell::new(Vec::new()),
                current: Observable::new(None),
                spawner: Rc::new(spawner),
                close_lock: Mutex::new(()),
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> NavigatorConfig {
        self.inner.config
    }

    /// Push `view` and start loading it in the background.
    ///
    /// The load is fire-and-forget: failures are logged, never returned.
    pub fn navigate_to(&self, view: View) -> Result<(), NavigationError> {
        let id = view.id();
        if view.is_closed() {
            tracing::error!(view = %id, name = view.name(), "navigate_to on a closed view");
            return Err(NavigationError::ViewClosed(id));
        }
        if self.contains(id) {
            tracing::error!(view = %id, name = view.name(), "navigate_to on a stacked view");
            return Err(NavigationError::AlreadyInStack(id));
        }

        let load = view.ensure_loaded();
        let name = view.name().to_owned();
        self.inner
            .spawner
            .spawn_local(async move {
                if let Err(err) = load.await {
                    tracing::warn!(view = %id, name = %name, error = %err, "view failed to load");
                }
            })
            .map_err(NavigationError::Spawn)?;

        let navigator = Rc::downgrade(&self.inner);
        let closed = view.on_closed(move |id| on_view_closed(&navigator, id));
        self.inner.entries.borrow_mut().push(StackEntry {
            view,
            _closed: closed,
        });
        tracing::debug!(view = %id, depth = self.len(), "navigated");
        self.refresh_current();
        Ok(())
    }

    /// Ask the current view to close.
    ///
    /// `Ok(true)` if the stack was empty or the view closed, `Ok(false)` on
    /// a veto (stack untouched).
    pub async fn try_close_current(&self) -> Result<bool, NavigationError> {
        let _cascade = self.begin_close().await?;
        Ok(self.close_top().await)
    }

    /// Close every view, top down, stopping at the first veto.
    ///
    /// `Ok(true)` only when the stack is drained. Views above the vetoing
    /// one stay closed.
    pub async fn try_close_all(&self) -> Result<bool, NavigationError> {
        let _cascade = self.begin_close().await?;
        loop {
            if self.is_empty() {
                return Ok(true);
            }
            if !self.close_top().await {
                tracing::debug!(remaining = self.len(), "close cascade vetoed");
                return Ok(false);
            }
        }
    }

    /// Id of the view on top of the stack.
    #[inline]
    #[must_use]
    pub fn current(&self) -> Option<ViewId> {
        self.inner.current.get()
    }

    /// View on top of the stack.
    #[must_use]
    pub fn current_view(&self) -> Option<View> {
        self.inner.entries.borrow().last().map(|entry| entry.view.clone())
    }

    /// Call `callback` whenever the current view changes.
    pub fn subscribe_current(&self, callback: impl Fn(&Option<ViewId>) + 'static) -> Subscription {
        self.inner.current.subscribe(callback)
    }

    /// Bumped once per change of the current view.
    #[must_use]
    pub fn current_version(&self) -> u64 {
        self.inner.current.version()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ViewId) -> bool {
        self.inner
            .entries
            .borrow()
            .iter()
            .any(|entry| entry.view.id() == id)
    }

    /// Stacked views, bottom first.
    #[must_use]
    pub fn views(&self) -> Vec<View> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.view.clone())
            .collect()
    }

    async fn begin_close(&self) -> Result<MutexGuard<'_, ()>, NavigationError> {
        match self.inner.config.close_policy {
            ClosePolicy::Queue => Ok(self.inner.close_lock.lock().await),
            ClosePolicy::Reject => self
                .inner
                .close_lock
                .try_lock()
                .ok_or(NavigationError::CloseInProgress),
        }
    }

    /// Ask the top view to close. Caller holds the close lock.
    async fn close_top(&self) -> bool {
        let Some(view) = self.current_view() else {
            return true;
        };
        tracing::debug!(view = %view.id(), name = view.name(), "asking view to close");
        let closed = view.try_close().await;
        if !closed {
            tracing::debug!(view = %view.id(), name = view.name(), "view vetoed close");
        }
        closed
    }

    fn remove(&self, id: ViewId) -> Option<View> {
        let removed = {
            let mut entries = self.inner.entries.borrow_mut();
            let pos = entries.iter().position(|entry| entry.view.id() == id)?;
            entries.remove(pos)
        };
        Some(removed.view)
    }

    fn refresh_current(&self) {
        let top = self
            .inner
            .entries
            .borrow()
            .last()
            .map(|entry| entry.view.id());
        self.inner.current.set(top);
    }
}

fn on_view_closed(navigator: &Weak<NavigatorInner>, id: ViewId) {
    let Some(inner) = navigator.upgrade() else {
        return;
    };
    let navigator = Navigator { inner };
    let Some(view) = navigator.remove(id) else {
        tracing::error!(view = %id, "closed notification for a view this navigator does not own");
        panic!("closed notification for {id}, which this navigator does not own");
    };
    tracing::debug!(view = %id, name = view.name(), depth = navigator.len(), "view removed");
    navigator.refresh_current();
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("views", &self.views())
            .field("current", &self.current())
            .field("config", &self.inner.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{LoadError, LoadStatus, ViewModel};
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::{LocalPool, block_on};
    use std::cell::Cell;
    use std::collections::HashMap;

    /// Records close requests into a shared log; vetoes on demand.
    struct Screen {
        name: &'static str,
        veto: Cell<bool>,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    #[async_trait(?Send)]
    impl ViewModel for Screen {
        fn name(&self) -> &str {
            self.name
        }

        async fn try_close(&self) -> bool {
            self.log.borrow_mut().push(self.name);
            !self.veto.get()
        }
    }

    struct Confirm {
        answer: RefCell<Option<oneshot::Receiver<bool>>>,
    }

    #[async_trait(?Send)]
    impl ViewModel for Confirm {
        async fn try_close(&self) -> bool {
            let rx = self.answer.borrow_mut().take();
            match rx {
                Some(rx) => rx.await.unwrap_or(false),
                None => true,
            }
        }
    }

    struct Broken;

    #[async_trait(?Send)]
    impl ViewModel for Broken {
        async fn load(&self) -> Result<(), LoadError> {
            Err(LoadError::new("corrupt save"))
        }
    }

    struct Fixture {
        pool: LocalPool,
        nav: Navigator,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_policy(ClosePolicy::Queue)
        }

        fn with_policy(policy: ClosePolicy) -> Self {
            let pool = LocalPool::new();
            let nav = Navigator::with_config(
                pool.spawner(),
                NavigatorConfig::default().with_close_policy(policy),
            );
            Self {
                pool,
                nav,
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn screen(&self, name: &'static str, veto: bool) -> View {
            View::new(Screen {
                name,
                veto: Cell::new(veto),
                log: Rc::clone(&self.log),
            })
        }

        fn push(&mut self, name: &'static str, veto: bool) -> View {
            let view = self.screen(name, veto);
            self.nav.navigate_to(view.clone()).unwrap();
            self.pool.run_until_stalled();
            view
        }
    }

    #[test]
    fn navigate_sets_current_and_loads() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        assert_eq!(fx.nav.current(), Some(a.id()));
        assert_eq!(a.load_status(), LoadStatus::Loaded);
        let b = fx.push("b", false);
        assert_eq!(fx.nav.current(), Some(b.id()));
        assert_eq!(fx.nav.len(), 2);
        assert_eq!(fx.nav.views(), vec![a, b]);
    }

    #[test]
    fn navigate_twice_is_rejected() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        let err = fx.nav.navigate_to(a.clone()).unwrap_err();
        assert!(matches!(err, NavigationError::AlreadyInStack(id) if id == a.id()));
        assert_eq!(fx.nav.len(), 1);
    }

    #[test]
    fn closed_view_cannot_be_reopened() {
        let fx = Fixture::new();
        let a = fx.screen("a", false);
        a.close();
        let err = fx.nav.navigate_to(a).unwrap_err();
        assert!(matches!(err, NavigationError::ViewClosed(_)));
        assert!(fx.nav.is_empty());
    }

    #[test]
    fn close_current_on_empty_stack() {
        let fx = Fixture::new();
        assert!(block_on(fx.nav.try_close_current()).unwrap());
        assert_eq!(fx.nav.current_version(), 0);
        assert!(fx.log.borrow().is_empty());
    }

    #[test]
    fn close_current_pops_top() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        let b = fx.push("b", false);
        assert!(block_on(fx.nav.try_close_current()).unwrap());
        assert!(b.is_closed());
        assert_eq!(fx.nav.current(), Some(a.id()));
        assert_eq!(b.closed_handler_count(), 0);
    }

    #[test]
    fn veto_leaves_stack_untouched() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        let b = fx.push("b", true);
        let version = fx.nav.current_version();

        assert!(!block_on(fx.nav.try_close_current()).unwrap());
        assert_eq!(fx.nav.len(), 2);
        assert_eq!(fx.nav.current(), Some(b.id()));
        assert_eq!(fx.nav.current_version(), version);
    }

    #[test]
    fn close_all_stops_at_bottom_veto() {
        let mut fx = Fixture::new();
        let bottom = fx.push("bottom", true);
        fx.push("middle", false);
        fx.push("top", false);

        assert!(!block_on(fx.nav.try_close_all()).unwrap());
        assert_eq!(*fx.log.borrow(), vec!["top", "middle", "bottom"]);
        assert_eq!(fx.nav.current(), Some(bottom.id()));
        assert_eq!(fx.nav.len(), 1);
    }

    #[test]
    fn close_all_drains() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        fx.push("b", false);
        assert!(block_on(fx.nav.try_close_all()).unwrap());
        assert!(fx.nav.is_empty());
        assert_eq!(fx.nav.current(), None);
    }

    #[test]
    fn out_of_band_close_below_top_keeps_current() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        let b = fx.push("b", false);
        let c = fx.push("c", false);
        let version = fx.nav.current_version();

        b.close();
        assert_eq!(fx.nav.views(), vec![a, c.clone()]);
        assert_eq!(fx.nav.current(), Some(c.id()));
        assert_eq!(fx.nav.current_version(), version);
    }

    #[test]
    fn out_of_band_close_of_top_updates_current() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        let b = fx.push("b", false);
        b.close();
        assert_eq!(fx.nav.current(), Some(a.id()));
    }

    #[test]
    fn current_subscribers_see_each_change() {
        let mut fx = Fixture::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = fx
            .nav
            .subscribe_current(move |id| seen_clone.borrow_mut().push(*id));

        let a = fx.push("a", false);
        let b = fx.push("b", false);
        block_on(fx.nav.try_close_current()).unwrap();
        assert_eq!(*seen.borrow(), vec![Some(a.id()), Some(b.id()), Some(a.id())]);
    }

    #[test]
    fn reentrant_navigation_from_closed_handler() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        let b = fx.push("b", false);
        let replacement = fx.screen("replacement", false);

        let nav = fx.nav.clone();
        let next = replacement.clone();
        let _hook = b.on_closed(move |_| nav.navigate_to(next.clone()).unwrap());

        assert!(block_on(fx.nav.try_close_current()).unwrap());
        assert_eq!(fx.nav.current(), Some(replacement.id()));
        assert_eq!(fx.nav.len(), 2);
    }

    #[test]
    fn reentrant_push_during_cascade_is_closed_too() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        let b = fx.push("b", false);
        let late = fx.screen("late", false);

        let nav = fx.nav.clone();
        let next = late.clone();
        let _hook = b.on_closed(move |_| nav.navigate_to(next.clone()).unwrap());

        assert!(block_on(fx.nav.try_close_all()).unwrap());
        assert_eq!(*fx.log.borrow(), vec!["b", "late", "a"]);
        assert!(late.is_closed());
    }

    #[test]
    fn queued_close_waits_for_running_cascade() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        let (tx, rx) = oneshot::channel();
        let confirm = View::new(Confirm {
            answer: RefCell::new(Some(rx)),
        });
        fx.nav.navigate_to(confirm.clone()).unwrap();

        let first = Rc::new(Cell::new(None));
        let second = Rc::new(Cell::new(None));
        for slot in [Rc::clone(&first), Rc::clone(&second)] {
            let nav = fx.nav.clone();
            fx.pool
                .spawner()
                .spawn_local(async move { slot.set(Some(nav.try_close_current().await.unwrap())) })
                .unwrap();
        }

        fx.pool.run_until_stalled();
        assert!(confirm.is_closing());
        assert_eq!(first.get(), None);
        assert_eq!(second.get(), None);
        assert!(fx.log.borrow().is_empty());

        tx.send(true).unwrap();
        fx.pool.run_until_stalled();
        assert_eq!(first.get(), Some(true));
        assert_eq!(second.get(), Some(true));
        // The queued close ran against the fresh top.
        assert_eq!(*fx.log.borrow(), vec!["a"]);
        assert!(fx.nav.is_empty());
    }

    #[test]
    fn rejecting_policy_refuses_concurrent_close() {
        let mut fx = Fixture::with_policy(ClosePolicy::Reject);
        let (tx, rx) = oneshot::channel();
        let confirm = View::new(Confirm {
            answer: RefCell::new(Some(rx)),
        });
        fx.nav.navigate_to(confirm.clone()).unwrap();

        let nav = fx.nav.clone();
        let outcome = Rc::new(Cell::new(None));
        let outcome_clone = Rc::clone(&outcome);
        fx.pool
            .spawner()
            .spawn_local(async move { outcome_clone.set(Some(nav.try_close_all().await.unwrap())) })
            .unwrap();
        fx.pool.run_until_stalled();

        let err = block_on(fx.nav.try_close_current()).unwrap_err();
        assert!(matches!(err, NavigationError::CloseInProgress));

        tx.send(false).unwrap();
        fx.pool.run_until_stalled();
        assert_eq!(outcome.get(), Some(false));
        assert_eq!(fx.nav.current(), Some(confirm.id()));
        assert!(block_on(fx.nav.try_close_current()).unwrap());
    }

    #[test]
    fn load_failure_does_not_affect_stack() {
        let mut fx = Fixture::new();
        let view = View::new(Broken);
        fx.nav.navigate_to(view.clone()).unwrap();
        fx.pool.run_until_stalled();
        assert!(matches!(view.load_status(), LoadStatus::Failed(_)));
        assert_eq!(fx.nav.current(), Some(view.id()));
    }

    #[test]
    fn dropping_navigator_releases_subscriptions() {
        let mut fx = Fixture::new();
        let a = fx.push("a", false);
        assert_eq!(a.closed_handler_count(), 1);
        drop(fx.nav);
        assert_eq!(a.closed_handler_count(), 0);
        assert!(a.close());
    }

    #[test]
    #[should_panic(expected = "which this navigator does not own")]
    fn closed_notification_for_unowned_view_panics() {
        let mut fx = Fixture::new();
        fx.push("a", false);
        let stranger = fx.screen("stranger", false);
        on_view_closed(&Rc::downgrade(&fx.nav.inner), stranger.id());
    }

    #[test]
    fn closed_notification_after_navigator_drop_is_ignored() {
        let fx = Fixture::new();
        let stranger = fx.screen("stranger", false);
        let weak = Rc::downgrade(&fx.nav.inner);
        drop(fx.nav);
        on_view_closed(&weak, stranger.id());
    }

    #[test]
    fn close_policy_env() {
        let env = HashMap::from([(ENV_CLOSE_POLICY, "Reject")]);
        let parsed = from_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert!(parsed.is_clean());
        assert_eq!(parsed.config.close_policy, ClosePolicy::Reject);

        let env = HashMap::from([(ENV_CLOSE_POLICY, "later")]);
        let parsed = from_env_with(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(parsed.config.close_policy, ClosePolicy::Queue);
        assert_eq!(parsed.errors[0].field, "close_policy");
    }

    #[test]
    fn error_display() {
        assert_eq!(
            NavigationError::CloseInProgress.to_string(),
            "a close cascade is already in progress"
        );
    }
}
