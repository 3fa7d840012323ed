#![forbid(unsafe_code)]

//! Root view model: owns the navigator and the frame-rate readout.
//!
//! Loading the shell shows the initial screen. Closing it closes every
//! stacked screen top down, so a single veto anywhere keeps the app alive.

use std::cell::RefCell;
use std::time::Instant;

use async_trait::async_trait;
use futures::task::LocalSpawn;

use crate::frame::{FrameRateConfig, FrameRateCounter};
use crate::navigator::{Navigator, NavigatorConfig};
use crate::reactive::Observable;
use crate::view::{LoadError, View, ViewModel};

type InitialView = Box<dyn Fn(&Navigator) -> View>;

/// Application root.
pub struct Shell {
    navigator: Navigator,
    initial: InitialView,
    frames: RefCell<FrameRateCounter>,
    fps: Observable<u32>,
    quit_requested: Observable<bool>,
}

impl Shell {
    /// `initial` builds the first screen. It receives the navigator so the
    /// screen can navigate onward.
    pub fn new(
        spawner: impl LocalSpawn + 'static,
        initial: impl Fn(&Navigator) -> View + 'static,
    ) -> Self {
        Self::with_config(
            spawner,
            NavigatorConfig::default(),
            FrameRateConfig::default(),
            initial,
        )
    }

    /// Build from environment configuration.
    pub fn from_env(
        spawner: impl LocalSpawn + 'static,
        initial: impl Fn(&Navigator) -> View + 'static,
    ) -> Self {
        let navigator = NavigatorConfig::from_env_with_diagnostics();
        let frames = FrameRateConfig::from_env_with_diagnostics();
        for err in navigator.errors.iter().chain(frames.errors.iter()) {
            tracing::warn!(error = %err, "ignoring invalid configuration");
        }
        Self::with_config(spawner, navigator.config, frames.config, initial)
    }

    pub fn with_config(
        spawner: impl LocalSpawn + 'static,
        navigator: NavigatorConfig,
        frames: FrameRateConfig,
        initial: impl Fn(&Navigator) -> View + 'static,
    ) -> Self {
        Self {
            navigator: Navigator::with_config(spawner, navigator),
            initial: Box::new(initial),
            frames: RefCell::new(FrameRateCounter::new(frames)),
            fps: Observable::new(0),
            quit_requested: Observable::new(false),
        }
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Record a rendered frame and publish the rounded rate.
    pub fn process_frame(&self, now: Instant) {
        let fps = self.frames.borrow_mut().tick(now);
        self.fps.set(fps.round() as u32);
    }

    /// Frames per second, for display.
    #[must_use]
    pub fn fps(&self) -> &Observable<u32> {
        &self.fps
    }

    /// Ask the host to exit. The host decides whether to close first.
    pub fn quit(&self) {
        tracing::info!(depth = self.navigator.len(), "quit requested");
        self.quit_requested.set(true);
    }

    #[must_use]
    pub fn quit_requested(&self) -> &Observable<bool> {
        &self.quit_requested
    }
}

#[async_trait(?Send)]
impl ViewModel for Shell {
    fn name(&self) -> &str {
        "shell"
    }

    async fn load(&self) -> Result<(), LoadError> {
        let view = (self.initial)(&self.navigator);
        self.navigator
            .navigate_to(view)
            .map_err(|err| LoadError::new(err.to_string()))
    }

    async fn try_close(&self) -> bool {
        match self.navigator.try_close_all().await {
            Ok(closed) => closed,
            Err(err) => {
                tracing::warn!(error = %err, "shell close refused");
                false
            }
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("navigator", &self.navigator)
            .field("fps", &self.fps.get())
            .field("quit_requested", &self.quit_requested.get())
            .finish_non_exhaustive()
    }
}
