//! Invocation driver: assemble a descriptor, call the builder, then
//! verify (build mode) or run and clean up (dev mode).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::args::{parse_build_args, ArgsError};
use crate::builder::{BuildError, Builder};
use crate::config::Config;
use crate::descriptor::{BuildDescriptor, Plugin};
use crate::reconcile::reconcile_replacements;
use crate::signal::{wait_child, CancelToken};
use crate::toolchain::{ToolchainError, WorkspaceInspector};

/// Default artifact name for one-shot builds.
#[cfg(windows)]
pub const DEFAULT_OUTPUT: &str = "lattice.exe";
#[cfg(not(windows))]
pub const DEFAULT_OUTPUT: &str = "lattice";

/// Fixed temporary artifact path for dev builds.
pub const DEV_OUTPUT: &str = "./lattice";

/// Errors surfaced by either mode.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Args(#[from] ArgsError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("running {command}: {source}")]
    Spawn {
        command: String,
        source: io::Error,
    },

    #[error("waiting for {command}: {source}")]
    Wait {
        command: String,
        source: io::Error,
    },

    #[error("{command} exited with {status}")]
    Exited {
        command: String,
        status: std::process::ExitStatus,
    },
}

impl RunError {
    /// Exit code the process should report for this error. A run error
    /// carries the child's own status through; everything else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Exited { status, .. } => status.code().unwrap_or(1),
            _ => 1,
        }
    }
}

/// One-shot build: produce a named binary and smoke-test it.
///
/// Any failure is fatal to the whole invocation; partial artifacts are
/// not cleaned up.
pub fn run_build(
    token: &CancelToken,
    config: &Config,
    builder: &dyn Builder,
    args: &[String],
) -> Result<(), RunError> {
    let parsed = parse_build_args(args)?;

    // an explicit version argument wins over the environment default
    let lattice_version = if parsed.version.is_empty() {
        config.lattice_version.clone()
    } else {
        parsed.version
    };

    let output = if parsed.output.is_empty() {
        DEFAULT_OUTPUT.to_string()
    } else {
        parsed.output
    };

    let descriptor = BuildDescriptor {
        lattice_version,
        plugins: parsed.plugins,
        replacements: parsed.replacements,
        cgo_enabled: parsed.cgo_enabled,
    };
    builder.build(token, &descriptor, Path::new(&output))?;

    // prove the build works by asking the binary for its version
    let artifact = executable_path(Path::new(&output));
    let command = format!("{} version", artifact.display());
    tracing::info!("{command}");

    let mut child = Command::new(&artifact)
        .arg("version")
        .spawn()
        .map_err(|source| RunError::Spawn {
            command: command.clone(),
            source,
        })?;
    let status = wait_child(token, &mut child).map_err(|source| RunError::Wait {
        command: command.clone(),
        source,
    })?;
    if !status.success() {
        return Err(RunError::Exited { command, status });
    }

    Ok(())
}

/// Dev iteration: build from the local working tree, run the artifact
/// with forwarded args, delete it.
///
/// Build failure is returned to the caller rather than aborting in
/// place; cleanup always runs once the child wait resolves.
pub fn run_dev(
    token: &CancelToken,
    config: &Config,
    builder: &dyn Builder,
    inspector: &dyn WorkspaceInspector,
    args: &[String],
    output: &Path,
) -> Result<(), RunError> {
    let current_module = inspector.current_module()?;
    let module_dir = inspector.module_dir()?;
    let lines = inspector.replacement_lines()?;

    let replacements = reconcile_replacements(&current_module, &module_dir, &lines);

    // always build from local source: the sole plugin is the module
    // being developed, unpinned, with its source replaced above
    let descriptor = BuildDescriptor {
        lattice_version: config.lattice_version.clone(),
        plugins: vec![Plugin {
            module: current_module,
            version: String::new(),
        }],
        replacements,
        cgo_enabled: false,
    };
    builder.build(token, &descriptor, output)?;

    let artifact = executable_path(output);
    let command = format!("{} {}", artifact.display(), args.join(" "));
    tracing::info!("running {command}");

    let mut child = Command::new(&artifact)
        .args(args)
        .spawn()
        .map_err(|source| RunError::Spawn {
            command: command.clone(),
            source,
        })?;

    let result = match wait_child(token, &mut child) {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(RunError::Exited { command, status }),
        Err(source) => Err(RunError::Wait { command, source }),
    };

    // the artifact is temporary; the child may already have removed it
    if let Err(err) = fs::remove_file(output) {
        if err.kind() != io::ErrorKind::NotFound {
            tracing::warn!("deleting temporary binary {}: {err}", output.display());
        }
    }

    result
}

/// Force a relative artifact path into explicit `./` form so the file
/// itself is executed rather than looked up on the system path.
fn executable_path(output: &Path) -> PathBuf {
    if output.is_absolute() {
        output.to_path_buf()
    } else {
        Path::new(".").join(output)
    }
}
