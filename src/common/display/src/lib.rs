//! Display and visualization utilities for tessera.
//!
//! Provides tree formatting for logical plans.

mod tree;

pub use tree::{render_tree, TreeDisplay};
