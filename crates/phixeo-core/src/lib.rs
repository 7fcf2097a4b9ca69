//! Core data model for Phixeo node graphs.
//!
//! Source text flows through this crate in one direction:
//!
//! - [`classify`] maps a line to a [`NodeKind`] (or skips it).
//! - [`layout`] places every node on a golden-ratio spiral.
//! - [`builder`] turns indented source into a [`Forest`] of nodes with
//!   explicit `parent`/`children` links.
//! - [`optimize`] folds runs of structurally identical siblings into
//!   aggregate ("fractal") nodes.
//! - [`persist`] reads and writes the editor's JSON record format.
//!
//! Execution lives in the `phixeo-runtime` crate.

pub mod builder;
pub mod classify;
pub mod error;
pub mod graph;
pub mod id;
pub mod layout;
pub mod node;
pub mod optimize;
pub mod persist;

// Re-export commonly used types
pub use builder::{build, GraphBuilder};
pub use classify::classify;
pub use error::CoreError;
pub use graph::Forest;
pub use id::NodeId;
pub use layout::{spiral_position, Point};
pub use node::{Node, NodeKind};
pub use optimize::{optimize, OptimizeReport};
