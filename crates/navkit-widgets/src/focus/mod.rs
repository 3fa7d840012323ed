#![forbid(unsafe_code)]

//! Directional focus: element tree capability, override grid, default
//! traversal, per-scope memory, and the router tying them together.

pub mod config;
pub mod grid;
pub mod memory;
pub mod router;
pub mod traversal;
pub mod tree;

pub use config::RouterConfig;
pub use grid::{FocusGrid, GridEntry, GridError};
pub use memory::FocusMemory;
pub use router::{FocusEvent, FocusRouter, KeyOutcome};
pub use tree::{ElementId, ElementKind, ElementNode, ElementTree, Scene, SceneError};
