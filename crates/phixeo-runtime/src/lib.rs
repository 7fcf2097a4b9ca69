//! Execution engine for Phixeo node forests.
//!
//! Runs a [`phixeo_core::Forest`] on a fixed-size worker pool against one
//! shared [`Environment`].
//!
//! # Architecture
//!
//! - [`expr`] parses node text into a small expression language, and
//!   [`eval`] evaluates it. Nothing is handed to a host interpreter.
//! - [`plan`] compiles each node once into a [`plan::Plan`].
//! - [`state`] holds the [`Executor`], its [`RuntimeConfig`] and the
//!   per-node [`NodeState`] machine.
//! - [`env`] is the binding table plus output buffer, kept behind a single
//!   mutex during a run.
//! - [`trace`] records evaluation steps when tracing is enabled.
//!
//! # Usage
//!
//! ```ignore
//! let forest = phixeo_core::build(source);
//! let report = Executor::new(&forest, RuntimeConfig::default())?.run()?;
//! println!("{}", report.output_text());
//! ```

pub mod env;
pub mod error;
pub mod eval;
pub mod expr;
pub mod plan;
pub mod state;
pub mod trace;
pub mod value;

pub use env::Environment;
pub use error::{EvalError, NodeError, RunError};
pub use state::{execute, Executor, NodeState, RunReport, RuntimeConfig, DEFAULT_WORKERS};
pub use trace::TraceEntry;
pub use value::Value;
