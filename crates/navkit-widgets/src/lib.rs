#![forbid(unsafe_code)]

//! Focus navigation for navkit.
//!
//! # Role in navkit
//! `navkit-widgets` decides where keyboard focus goes when the user presses
//! an arrow key. Layouts author a [`focus::FocusGrid`] of directional
//! overrides; the [`focus::FocusRouter`] consults it, falls back to child
//! order traversal, and adjusts moves into list-like containers so focus
//! lands on a concrete item.
//!
//! # How it fits in the system
//! The router is UI-agnostic: hosts expose their visual tree through the
//! [`focus::ElementTree`] trait and feed key events from `navkit-core`.
//! [`focus::Scene`] is an in-memory tree for tests and simple hosts.

pub mod focus;
