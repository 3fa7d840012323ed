#![forbid(unsafe_code)]

//! Logging and tracing support.
//!
//! Router code logs through `navkit_core::{debug!, trace!, warn!, ..}`. With
//! the `tracing` feature these are the `tracing` macros; without it they
//! compile away, so widget crates carry no logging cost by default.
//!
//! With `tracing-json`, [`init_json`] installs a JSON subscriber filtered by
//! `RUST_LOG` for hosts that have no subscriber of their own.

#[cfg(feature = "tracing")]
pub use tracing::{debug, error, info, trace, warn};

// Without tracing the event macros expand to nothing.
#[cfg(not(feature = "tracing"))]
mod noop_macros {
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }
}

/// Install a global JSON subscriber honoring `RUST_LOG` (default `info`).
///
/// Returns `false` when a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json() -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
