//! Workspace inspection via the Go toolchain.
//!
//! Dev mode needs three facts about the module the user is standing in:
//! its identifier, its root directory, and the active replace directives
//! across the whole dependency graph. All three come from `go list`.

use std::process::Command;

/// Queries about the module workspace the tool runs inside.
///
/// Each query may fail with an opaque toolchain error; callers propagate
/// it unchanged.
pub trait WorkspaceInspector {
    /// Identifier of the module under development.
    fn current_module(&self) -> Result<String, ToolchainError>;

    /// Absolute root directory of that module's source.
    fn module_dir(&self) -> Result<String, ToolchainError>;

    /// Active replace directives across the whole dependency graph, as
    /// `path => replacement` text lines, one per line.
    fn replacement_lines(&self) -> Result<String, ToolchainError>;
}

/// Errors from toolchain queries.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
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

    #[error("{command} produced non-UTF-8 output")]
    Encoding { command: String },
}

/// The real inspector, shelling out to `go list`.
#[derive(Debug, Default, Clone)]
pub struct GoWorkspace;

impl GoWorkspace {
    fn go_list(&self, args: &[&str]) -> Result<String, ToolchainError> {
        let command = format!("go list {}", args.join(" "));
        let output = Command::new("go")
            .arg("list")
            .args(args)
            .output()
            .map_err(|source| ToolchainError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ToolchainError::Failed {
                command,
                status: output.status,
            });
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| ToolchainError::Encoding { command })?;
        Ok(stdout.trim().to_string())
    }
}

impl WorkspaceInspector for GoWorkspace {
    fn current_module(&self) -> Result<String, ToolchainError> {
        self.go_list(&["-m"])
    }

    fn module_dir(&self) -> Result<String, ToolchainError> {
        self.go_list(&["-m", "-f={{.Dir}}"])
    }

    fn replacement_lines(&self) -> Result<String, ToolchainError> {
        self.go_list(&[
            "-m",
            "-f={{if .Replace}}{{.Path}} => {{.Replace}}{{end}}",
            "all",
        ])
    }
}
