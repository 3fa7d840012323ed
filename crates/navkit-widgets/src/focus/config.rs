#![forbid(unsafe_code)]

//! Focus router configuration.

use std::env;

use navkit_core::config::{ConfigParse, read_bool};

pub const ENV_FOCUS_WRAP: &str = "NAVKIT_FOCUS_WRAP";
pub const ENV_FOCUS_BRING_INTO_VIEW: &str = "NAVKIT_FOCUS_BRING_INTO_VIEW";

/// Router behavior knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Whether default traversal wraps past the first/last stop.
    pub wrap: bool,
    /// Whether newly focused elements are scrolled into view.
    pub bring_into_view: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            wrap: false,
            bring_into_view: true,
        }
    }
}

impl RouterConfig {
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
    pub fn with_wrap(mut self, wrap: bool) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub fn with_bring_into_view(mut self, enabled: bool) -> Self {
        self.bring_into_view = enabled;
        self
    }
}

fn from_env_with<F>(mut get: F) -> ConfigParse<RouterConfig>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = RouterConfig::default();
    let mut errors = Vec::new();
    read_bool(&mut get, ENV_FOCUS_WRAP, "wrap", &mut config.wrap, &mut errors);
    read_bool(
        &mut get,
        ENV_FOCUS_BRING_INTO_VIEW,
        "bring_into_view",
        &mut config.bring_into_view,
        &mut errors,
    );
    ConfigParse { config, errors }
}
