#![forbid(unsafe_code)]

//! Views: a [`ViewModel`] plus its load/close lifecycle.
//!
//! A [`View`] is the handle the navigator stacks. It owns the lifecycle
//! bookkeeping so view models only implement the async hooks:
//!
//! ```text
//! load:  Unloaded ──ensure_loaded──▶ Loading ──▶ Loaded | Failed
//! open:  Open ──try_close──▶ Closing ──accept──▶ Closed
//!                              └──────veto─────▶ Open
//! ```
//!
//! # Invariants
//!
//! 1. `ViewModel::load` runs at most once per view, however many times
//!    [`View::ensure_loaded`] is called.
//! 2. The closed notification fires exactly once. Handlers registered after
//!    that never run.
//! 3. A closed view stays closed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::future::{self, FutureExt, LocalBoxFuture, Shared};

static VIEW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
    fn new() -> Self {
        Self(VIEW_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

/// A view model failed to load.
///
/// Cloned to every waiter of the shared load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed: {}", self.message)
    }
}

impl std::error::Error for LoadError {}

/// Screen state with an async lifecycle.
///
/// Both hooks run on the UI thread and may suspend (awaiting a resource,
/// awaiting a "discard changes?" confirmation).
#[async_trait(?Send)]
pub trait ViewModel {
    /// Name used in logs.
    fn name(&self) -> &str {
        "view"
    }

    /// Load resources. Called at most once.
    async fn load(&self) -> Result<(), LoadError> {
        Ok(())
    }

    /// Decide whether to close. Returning `false` vetoes the close.
    async fn try_close(&self) -> bool {
        true
    }
}

/// Observable load state of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
    Failed(LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenState {
    Open,
    Closing,
    Closed,
}

type LoadFuture = Shared<LocalBoxFuture<'static, Result<(), LoadError>>>;

enum LoadState {
    Unloaded,
    Loading(LoadFuture),
    Loaded,
    Failed(LoadError),
}

type ClosedHandler = Box<dyn FnOnce(ViewId)>;

struct ViewShared {
    id: ViewId,
    model: Rc<dyn ViewModel>,
    load: RefCell<LoadState>,
    open: Cell<OpenState>,
    closed_handlers: RefCell<Vec<(u64, ClosedHandler)>>,
    next_handler: Cell<u64>,
}

/// Shared handle to a view model and its lifecycle.
///
/// Cloning yields another handle to the same view. Equality is identity.
#[derive(Clone)]
pub struct View {
    shared: Rc<ViewShared>,
}

impl View {
    pub fn new<M: ViewModel + 'static>(model: M) -> Self {
        Self::from_rc(Rc::new(model))
    }

    /// Wrap a view model the caller keeps a handle to.
    pub fn from_rc<M: ViewModel + 'static>(model: Rc<M>) -> Self {
        let model: Rc<dyn ViewModel> = model;
        Self {
            shared: Rc::new(ViewShared {
                id: ViewId::new(),
                model,
                load: RefCell::new(LoadState::Unloaded),
                open: Cell::new(OpenState::Open),
                closed_handlers: RefCell::new(Vec::new()),
                next_handler: Cell::new(0),
            }),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ViewId {
        self.shared.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.shared.model.name()
    }

    #[must_use]
    pub fn model(&self) -> &Rc<dyn ViewModel> {
        &self.shared.model
    }

    #[must_use]
    pub fn load_status(&self) -> LoadStatus {
        match &*self.shared.load.borrow() {
            LoadState::Unloaded => LoadStatus::Unloaded,
            LoadState::Loading(_) => LoadStatus::Loading,
            LoadState::Loaded => LoadStatus::Loaded,
            LoadState::Failed(err) => LoadStatus::Failed(err.clone()),
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.open.get() == OpenState::Closed
    }

    /// Whether a `try_close` is currently waiting on the view model.
    #[must_use]
    pub fn is_closing(&self) -> bool {
        self.shared.open.get() == OpenState::Closing
    }

    /// Load the view model if nobody has started to yet.
    ///
    /// Every call shares the first call's load. Once settled, the result is
    /// cached: a failed load is not retried.
    pub fn ensure_loaded(&self) -> LocalBoxFuture<'static, Result<(), LoadError>> {
        let mut state = self.shared.load.borrow_mut();
        match &*state {
            LoadState::Loaded => return future::ready(Ok(())).boxed_local(),
            LoadState::Failed(err) => return future::ready(Err(err.clone())).boxed_local(),
            LoadState::Loading(pending) => return pending.clone().boxed_local(),
            LoadState::Unloaded => {}
        }

        let model = Rc::clone(&self.shared.model);
        let view = Rc::downgrade(&self.shared);
        let pending = async move {
            let result = model.load().await;
            if let Some(view) = view.upgrade() {
                *view.load.borrow_mut() = match &result {
                    Ok(()) => LoadState::Loaded,
                    Err(err) => LoadState::Failed(err.clone()),
                };
            }
            result
        }
        .boxed_local()
        .shared();
        *state = LoadState::Loading(pending.clone());
        pending.boxed_local()
    }

    /// Ask the view model to close, and close on acceptance.
    ///
    /// Returns `true` if the view is closed afterwards. A view that is
    /// already closed returns `true` without asking; a view already being
    /// asked returns `false`.
    pub async fn try_close(&self) -> bool {
        match self.shared.open.get() {
            OpenState::Closed => return true,
            OpenState::Closing => return false,
            OpenState::Open => {}
        }

        self.shared.open.set(OpenState::Closing);
        let model = Rc::clone(&self.shared.model);
        let accepted = model.try_close().await;

        // Closed out of band while the model was deciding.
        if self.is_closed() {
            return true;
        }
        if accepted {
            self.close();
        } else {
            self.shared.open.set(OpenState::Open);
        }
        accepted
    }

    /// Close unconditionally and fire the closed notification.
    ///
    /// View models that close themselves (a "back" button, a timeout) call
    /// this directly. Returns `false` if the view was already closed.
    pub fn close(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.shared.open.set(OpenState::Closed);

        let handlers = std::mem::take(&mut *self.shared.closed_handlers.borrow_mut());
        tracing::trace!(view = %self.id(), handlers = handlers.len(), "view closed");
        for (_, handler) in handlers {
            handler(self.id());
        }
        true
    }

    /// Run `handler` once when the view closes.
    ///
    /// Dropping the returned guard unregisters the handler. On a view that
    /// is already closed the handler is dropped without running.
    pub fn on_closed(&self, handler: impl FnOnce(ViewId) + 'static) -> ClosedSubscription {
        if self.is_closed() {
            return ClosedSubscription {
                view: Weak::new(),
                key: 0,
            };
        }
        let key = self.shared.next_handler.get();
        self.shared.next_handler.set(key + 1);
        self.shared
            .closed_handlers
            .borrow_mut()
            .push((key, Box::new(handler)));
        ClosedSubscription {
            view: Rc::downgrade(&self.shared),
            key,
        }
    }

    /// Registered closed handlers.
    #[must_use]
    pub fn closed_handler_count(&self) -> usize {
        self.shared.closed_handlers.borrow().len()
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for View {}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("open", &self.shared.open.get())
            .field("load", &self.load_status())
            .finish()
    }
}

/// RAII guard for a closed handler.
pub struct ClosedSubscription {
    view: Weak<ViewShared>,
    key: u64,
}

impl ClosedSubscription {
    /// Whether the handler is still waiting to run.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.view.upgrade().is_some_and(|view| {
            view.closed_handlers
                .borrow()
                .iter()
                .any(|(key, _)| *key == self.key)
        })
    }
}

impl Drop for ClosedSubscription {
    fn drop(&mut self) {
        let Some(view) = self.view.upgrade() else {
            return;
        };
        let removed = {
            let mut handlers = view.closed_handlers.borrow_mut();
            handlers
                .iter()
                .position(|(key, _)| *key == self.key)
                .map(|pos| handlers.remove(pos))
        };
        // Handler captures are dropped outside the borrow.
        drop(removed);
    }
}

impl fmt::Debug for ClosedSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosedSubscription")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
