//! Dev-mode driver tests.
//!
//! A mock inspector supplies the workspace facts and a recording stub
//! builder stands in for the toolchain, so the whole dev flow runs
//! without a Go installation.

use std::path::Path;
use std::sync::Mutex;

use xlattice::builder::{BuildError, Builder};
use xlattice::config::Config;
use xlattice::descriptor::{BuildDescriptor, Plugin, Replacement};
use xlattice::run::{run_dev, RunError};
use xlattice::signal::CancelToken;
use xlattice::toolchain::{ToolchainError, WorkspaceInspector};

/// Inspector with canned answers.
struct MockInspector {
    module: &'static str,
    dir: &'static str,
    lines: &'static str,
}

impl MockInspector {
    fn new() -> Self {
        Self {
            module: "github.com/acme/lattice-geoip",
            dir: "/home/dev/lattice-geoip",
            lines: "",
        }
    }

    fn with_lines(lines: &'static str) -> Self {
        Self {
            lines,
            ..Self::new()
        }
    }
}

impl WorkspaceInspector for MockInspector {
    fn current_module(&self) -> Result<String, ToolchainError> {
        Ok(self.module.to_string())
    }

    fn module_dir(&self) -> Result<String, ToolchainError> {
        Ok(self.dir.to_string())
    }

    fn replacement_lines(&self) -> Result<String, ToolchainError> {
        Ok(self.lines.to_string())
    }
}

/// Inspector whose queries fail, standing in for a broken toolchain.
struct FailingInspector;

impl WorkspaceInspector for FailingInspector {
    fn current_module(&self) -> Result<String, ToolchainError> {
        Err(ToolchainError::Spawn {
            command: "go list -m".to_string(),
            source: std::io::Error::other("go not found"),
        })
    }

    fn module_dir(&self) -> Result<String, ToolchainError> {
        unreachable!("current_module fails first")
    }

    fn replacement_lines(&self) -> Result<String, ToolchainError> {
        unreachable!("current_module fails first")
    }
}

/// Stub builder: records calls and writes the given script as the
/// artifact (unix), so the run step has something to execute.
struct ScriptBuilder {
    calls: Mutex<Vec<BuildDescriptor>>,
    script: Option<&'static str>,
}

impl ScriptBuilder {
    fn recording_only() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: None,
        }
    }

    #[cfg(unix)]
    fn with_script(script: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            script: Some(script),
        }
    }

    fn calls(&self) -> Vec<BuildDescriptor> {
        self.calls.lock().unwrap().clone()
    }
}

impl Builder for ScriptBuilder {
    fn build(
        &self,
        _token: &CancelToken,
        descriptor: &BuildDescriptor,
        output: &Path,
    ) -> Result<(), BuildError> {
        self.calls.lock().unwrap().push(descriptor.clone());
        if let Some(script) = self.script {
            write_script(output, script);
        }
        Ok(())
    }
}

struct FailingBuilder;

impl Builder for FailingBuilder {
    fn build(
        &self,
        _token: &CancelToken,
        _descriptor: &BuildDescriptor,
        _output: &Path,
    ) -> Result<(), BuildError> {
        Err(BuildError::Spawn {
            command: "go build".to_string(),
            source: std::io::Error::other("toolchain unavailable"),
        })
    }
}

#[cfg(unix)]
fn write_script(path: &Path, script: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, script).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(not(unix))]
fn write_script(_path: &Path, _script: &str) {}

// =============================================================================
// Descriptor assembly
// =============================================================================

#[test]
fn test_descriptor_builds_local_module_unpinned() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::recording_only();
    let inspector = MockInspector::new();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("lattice");

    // no artifact written, so the run step fails to spawn; descriptor
    // assembly happened first and is what this test is about
    let result = run_dev(
        &token,
        &Config::default(),
        &builder,
        &inspector,
        &[],
        &output,
    );
    assert!(matches!(result, Err(RunError::Spawn { .. })));

    let calls = builder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].plugins,
        vec![Plugin {
            module: "github.com/acme/lattice-geoip".into(),
            version: "".into(),
        }]
    );
    assert!(!calls[0].cgo_enabled);
}

#[test]
fn test_self_replacement_first_then_workspace_directives() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::recording_only();
    let inspector = MockInspector::with_lines("other/mod => ../other\nbad line\n");
    let dir = tempfile::tempdir().unwrap();

    let _ = run_dev(
        &token,
        &Config::default(),
        &builder,
        &inspector,
        &[],
        &dir.path().join("lattice"),
    );

    let descriptor = &builder.calls()[0];
    assert_eq!(
        descriptor.replacements,
        vec![
            Replacement {
                target: "github.com/acme/lattice-geoip".into(),
                source: "/home/dev/lattice-geoip".into(),
            },
            Replacement {
                target: "other/mod".into(),
                source: "../other".into(),
            },
        ]
    );
}

#[test]
fn test_env_default_version_threaded_through() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::recording_only();
    let config = Config {
        lattice_version: "v2.0.0".to_string(),
    };
    let dir = tempfile::tempdir().unwrap();

    let _ = run_dev(
        &token,
        &config,
        &builder,
        &MockInspector::new(),
        &[],
        &dir.path().join("lattice"),
    );

    assert_eq!(builder.calls()[0].lattice_version, "v2.0.0");
}

// =============================================================================
// Error ordering
// =============================================================================

#[test]
fn test_inspector_failure_aborts_before_build() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::recording_only();
    let dir = tempfile::tempdir().unwrap();

    let result = run_dev(
        &token,
        &Config::default(),
        &builder,
        &FailingInspector,
        &[],
        &dir.path().join("lattice"),
    );

    assert!(matches!(result, Err(RunError::Toolchain(_))));
    assert!(builder.calls().is_empty());
}

#[test]
fn test_builder_failure_is_returned_not_fatal() {
    let token = CancelToken::new();
    let dir = tempfile::tempdir().unwrap();

    let result = run_dev(
        &token,
        &Config::default(),
        &FailingBuilder,
        &MockInspector::new(),
        &[],
        &dir.path().join("lattice"),
    );

    assert!(matches!(result, Err(RunError::Build(_))));
}

// =============================================================================
// Run and cleanup
// =============================================================================

#[cfg(unix)]
#[test]
fn test_successful_run_deletes_artifact() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::with_script("#!/bin/sh\nexit 0\n");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("lattice");

    let result = run_dev(
        &token,
        &Config::default(),
        &builder,
        &MockInspector::new(),
        &[],
        &output,
    );

    assert!(result.is_ok(), "expected success, got {result:?}");
    assert!(!output.exists(), "temporary artifact should be deleted");
}

#[cfg(unix)]
#[test]
fn test_failed_run_still_deletes_artifact() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::with_script("#!/bin/sh\nexit 5\n");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("lattice");

    let result = run_dev(
        &token,
        &Config::default(),
        &builder,
        &MockInspector::new(),
        &[],
        &output,
    );

    match result {
        Err(RunError::Exited { status, .. }) => assert_eq!(status.code(), Some(5)),
        other => panic!("expected Exited, got {other:?}"),
    }
    assert!(!output.exists(), "temporary artifact should be deleted");
}

#[cfg(unix)]
#[test]
fn test_run_error_carries_child_exit_code() {
    let token = CancelToken::new();
    let builder = ScriptBuilder::with_script("#!/bin/sh\nexit 5\n");
    let dir = tempfile::tempdir().unwrap();

    let err = run_dev(
        &token,
        &Config::default(),
        &builder,
        &MockInspector::new(),
        &[],
        &dir.path().join("lattice"),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), 5);
}

#[cfg(unix)]
#[test]
fn test_vanished_artifact_tolerated() {
    let token = CancelToken::new();
    // the child removes its own binary before exiting
    let builder = ScriptBuilder::with_script("#!/bin/sh\nrm -- \"$0\"\nexit 0\n");
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("lattice");

    let result = run_dev(
        &token,
        &Config::default(),
        &builder,
        &MockInspector::new(),
        &[],
        &output,
    );

    assert!(result.is_ok(), "missing artifact is not an error: {result:?}");
}

#[cfg(unix)]
#[test]
fn test_forwarded_args_reach_the_child() {
    let token = CancelToken::new();
    // exits with the number of forwarded arguments
    let builder = ScriptBuilder::with_script("#!/bin/sh\nexit $#\n");
    let dir = tempfile::tempdir().unwrap();

    let err = run_dev(
        &token,
        &Config::default(),
        &builder,
        &MockInspector::new(),
        &["serve".to_string(), "--port".to_string(), "8080".to_string()],
        &dir.path().join("lattice"),
    )
    .unwrap_err();

    assert_eq!(err.exit_code(), 3);
}
