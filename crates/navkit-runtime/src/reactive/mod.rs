#![forbid(unsafe_code)]

//! Change-notifying values shared between the navigator and its host.
//!
//! - [`Observable`]: a shared, version-tracked value that notifies
//!   subscribers on change.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op.
//! 4. A subscriber never observes a value older than one it already saw.

pub mod observable;

pub use observable::{Observable, Subscription};
