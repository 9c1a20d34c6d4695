//! The external builder: scratch module assembly and `go build`.
//!
//! A build materializes a throwaway Go module whose generated main
//! imports the Lattice entrypoint plus a blank import per plugin, pins
//! the requested versions, applies replace directives, and compiles to
//! the caller's output path. The scratch directory is removed on all
//! exit paths.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::descriptor::BuildDescriptor;
use crate::signal::{wait_child, CancelToken};

/// Module path of the Lattice core.
pub const LATTICE_MODULE: &str = "github.com/lattice-dev/lattice";

/// Entrypoint package imported by the generated main.
const LATTICE_CMD_PACKAGE: &str = "github.com/lattice-dev/lattice/cmd";

/// Capability interface over the compilation toolchain.
///
/// Implementations resolve dependencies for the descriptor, compile, and
/// leave a single executable at `output`. Errors are opaque to callers.
pub trait Builder {
    fn build(
        &self,
        token: &CancelToken,
        descriptor: &BuildDescriptor,
        output: &Path,
    ) -> Result<(), BuildError>;
}

/// Errors from the build toolchain.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("build interrupted")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("running {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed {
        command: String,
        status: std::process::ExitStatus,
    },
}

/// Builds Lattice with the Go toolchain in a scratch module.
#[derive(Debug, Default, Clone)]
pub struct GoBuilder;

impl Builder for GoBuilder {
    fn build(
        &self,
        token: &CancelToken,
        descriptor: &BuildDescriptor,
        output: &Path,
    ) -> Result<(), BuildError> {
        let workspace = tempfile::Builder::new().prefix("xlattice-build").tempdir()?;
        let dir = workspace.path();
        tracing::debug!("build workspace: {}", dir.display());

        // the artifact lands relative to the caller's cwd, not the scratch dir
        let output = absolute(output)?;

        fs::write(dir.join("main.go"), generate_main(descriptor))?;

        let cgo = descriptor.cgo_enabled;
        run_go(token, dir, cgo, &["mod".into(), "init".into(), "lattice".into()])?;

        for replacement in &descriptor.replacements {
            let source = absolutize_source(&replacement.source, &std::env::current_dir()?);
            run_go(
                token,
                dir,
                cgo,
                &[
                    "mod".into(),
                    "edit".into(),
                    format!("-replace={}={}", replacement.target, source),
                ],
            )?;
        }

        run_go(
            token,
            dir,
            cgo,
            &["get".into(), module_at(LATTICE_MODULE, &descriptor.lattice_version)],
        )?;
        for plugin in &descriptor.plugins {
            run_go(
                token,
                dir,
                cgo,
                &["get".into(), module_at(&plugin.module, &plugin.version)],
            )?;
        }

        run_go(
            token,
            dir,
            cgo,
            &[
                "build".into(),
                "-o".into(),
                output.to_string_lossy().into_owned(),
            ],
        )?;

        Ok(())
    }
}

/// Run one `go` command in the scratch module, inheriting stdio.
fn run_go(token: &CancelToken, dir: &Path, cgo: bool, args: &[String]) -> Result<(), BuildError> {
    if token.is_cancelled() {
        return Err(BuildError::Cancelled);
    }

    let command = format!("go {}", args.join(" "));
    tracing::info!("exec: {command}");

    let mut child = Command::new("go")
        .args(args)
        .current_dir(dir)
        .env("CGO_ENABLED", if cgo { "1" } else { "0" })
        .spawn()
        .map_err(|source| BuildError::Spawn {
            command: command.clone(),
            source,
        })?;

    let status = wait_child(token, &mut child)?;
    if !status.success() {
        return Err(BuildError::Failed { command, status });
    }
    Ok(())
}

/// `module` or `module@version` for `go get`.
fn module_at(module: &str, version: &str) -> String {
    if version.is_empty() {
        module.to_string()
    } else {
        format!("{module}@{version}")
    }
}

/// Resolve a replacement source against `base` when it is a local path.
///
/// Local paths in replace directives start with `./` or `../`; they are
/// written relative to the user's cwd but interpreted relative to the
/// scratch module, so they have to be made absolute first. Module
/// sources (`other/mod@v1`) pass through untouched.
fn absolutize_source(source: &str, base: &Path) -> String {
    if source.starts_with("./") || source.starts_with("../") || source == "." || source == ".." {
        base.join(source).to_string_lossy().into_owned()
    } else {
        source.to_string()
    }
}

/// Make the output path absolute against the caller's cwd.
fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Render the generated `main.go` for a descriptor.
fn generate_main(descriptor: &BuildDescriptor) -> String {
    let mut src = String::new();
    src.push_str("package main\n\nimport (\n");
    src.push_str(&format!("\tlatticecmd \"{LATTICE_CMD_PACKAGE}\"\n"));
    if !descriptor.plugins.is_empty() {
        src.push('\n');
        for plugin in &descriptor.plugins {
            src.push_str(&format!("\t_ \"{}\"\n", plugin.module));
        }
    }
    src.push_str(")\n\nfunc main() {\n\tlatticecmd.Main()\n}\n");
    src
}
