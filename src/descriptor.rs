//! Build descriptor value types and the `--with` token grammar.
//!
//! A descriptor is assembled once per invocation, immutable thereafter,
//! and consumed exactly once by the builder: the Lattice version to
//! build, the plugin modules to compile in, the source replacements to
//! apply, and the CGO toggle.

use serde::{Deserialize, Serialize};

/// A plugin module to compile into the Lattice binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    /// Module path of the plugin (e.g., "github.com/acme/lattice-geoip").
    pub module: String,

    /// Version pin. Empty means the toolchain's default resolution
    /// (typically latest).
    pub version: String,
}

/// A source replacement directive.
///
/// Instructs the toolchain to substitute `source` (a local path or a
/// module@version) for `target` instead of any published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    /// Module path being overridden.
    pub target: String,

    /// What to substitute for it.
    pub source: String,
}

/// Everything the builder needs to produce one binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDescriptor {
    /// Lattice version to build. Empty means the toolchain default.
    pub lattice_version: String,

    /// Plugins in user-specified order. Order affects only the generated
    /// manifest, not semantics.
    pub plugins: Vec<Plugin>,

    /// Replacement directives in user-specified order.
    pub replacements: Vec<Replacement>,

    /// Whether the toolchain runs with CGO enabled. Disabled by default
    /// for reproducible builds.
    pub cgo_enabled: bool,
}

/// Errors from parsing a `--with` token.
#[derive(Debug, thiserror::Error)]
pub enum PluginParseError {
    /// The token had an empty module segment (e.g., "@v1" or "=../local").
    #[error("module name is required in {token:?}")]
    EmptyModule { token: String },
}

/// Parse one raw `module[@version][=replacement]` token.
///
/// The module is isolated before the version/replacement split, so a
/// token carrying both separators (`mod@v1.2.3=../local`) splits the
/// version from the replacement only within the right-hand remainder.
/// Empty version or replacement segments mean "unset"; an empty module
/// is an error.
pub fn parse_plugin_token(token: &str) -> Result<(String, String, String), PluginParseError> {
    let (module, version, replacement) = match token.split_once('@') {
        Some((module, rest)) => match rest.split_once('=') {
            Some((version, replacement)) => (module, version, replacement),
            None => (module, rest, ""),
        },
        None => match token.split_once('=') {
            Some((module, replacement)) => (module, "", replacement),
            None => (token, "", ""),
        },
    };

    if module.is_empty() {
        return Err(PluginParseError::EmptyModule {
            token: token.to_string(),
        });
    }

    Ok((
        module.to_string(),
        version.to_string(),
        replacement.to_string(),
    ))
}
