#![forbid(unsafe_code)]

//! View-stack runtime for navkit.
//!
//! # Role in navkit
//! `navkit-runtime` owns screen lifecycle: which view models are open, in
//! what order, and how closing unwinds them. The [`Navigator`] keeps the
//! stack and publishes the current view; [`View`] wraps a [`ViewModel`] with
//! idempotent loading and a single-fire closed notification.
//!
//! # Concurrency model
//! Everything runs on one thread. Loads and close requests are futures
//! driven by the host's local executor (any [`futures::task::LocalSpawn`]).
//! Close cascades are serialized per navigator; see [`ClosePolicy`].
//!
//! # Logging
//! Lifecycle events go through `tracing`. Enable the `tracing-json` feature
//! and call `navkit_core::logging::init_json()` for structured output.

pub mod frame;
pub mod navigator;
pub mod reactive;
pub mod shell;
pub mod view;

pub use frame::{FrameRateConfig, FrameRateCounter};
pub use navigator::{ClosePolicy, NavigationError, Navigator, NavigatorConfig};
pub use reactive::{Observable, Subscription};
pub use shell::Shell;
pub use view::{ClosedSubscription, LoadError, LoadStatus, View, ViewId, ViewModel};
