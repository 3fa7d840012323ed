#![forbid(unsafe_code)]

//! Core: key events, navigation directions, configuration and logging.
//!
//! # Role in navkit
//! `navkit-core` is the input layer shared by the focus router
//! (`navkit-widgets`) and the view-stack runtime (`navkit-runtime`). It owns
//! the normalized key event types, the four-way [`Direction`] the router
//! understands, the environment-driven configuration helpers, and the logging
//! facade.
//!
//! # How it fits in the system
//! Hosts translate their native input into [`event::KeyEvent`] values (the
//! optional `crossterm` feature does this for terminal backends) and hand
//! them to the focus router. Nothing here holds state.

pub mod config;
pub mod direction;
pub mod event;
pub mod logging;

pub use direction::Direction;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
