//! Process configuration, read once at startup and threaded explicitly.

/// Environment variable supplying the default Lattice version.
pub const VERSION_ENV: &str = "LATTICE_VERSION";

/// Immutable startup configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Default Lattice version used when no positional argument is
    /// given. Empty means the toolchain's own default resolution.
    pub lattice_version: String,
}

impl Config {
    /// Read configuration from the environment.
    pub fn from_env() -> Self {
        Self {
            lattice_version: std::env::var(VERSION_ENV).unwrap_or_default(),
        }
    }
}
