//! xlattice — build Lattice with plugins.
//!
//! Assembles a scratch Go module that combines a pinned Lattice release
//! with caller-supplied plugin modules, applies source-replacement
//! overrides, and drives the Go toolchain to a single executable. Dev
//! mode builds from the local working tree, runs the result, and deletes
//! it.

pub mod args;
pub mod builder;
pub mod config;
pub mod descriptor;
pub mod reconcile;
pub mod run;
pub mod signal;
pub mod toolchain;

pub use builder::{BuildError, Builder, GoBuilder};
pub use config::Config;
pub use descriptor::{BuildDescriptor, Plugin, Replacement};
pub use run::{run_build, run_dev, RunError};
pub use signal::CancelToken;
pub use toolchain::{GoWorkspace, ToolchainError, WorkspaceInspector};
