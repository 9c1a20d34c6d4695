//! Argument grammar for the `build` subcommand.
//!
//! Deliberately an explicit token-to-action loop rather than a flag
//! library: the trailing-flag-without-value error and the single
//! positional-version slot are part of the CLI contract.

use crate::descriptor::{parse_plugin_token, Plugin, PluginParseError, Replacement};

/// Parsed `build` arguments, before defaults are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArgs {
    /// Explicit Lattice version from the single positional token.
    /// Empty when not given.
    pub version: String,

    /// Output path from `--output`. Empty when not given.
    pub output: String,

    /// Whether `--enable-cgo` was passed.
    pub cgo_enabled: bool,

    /// Plugins accumulated from `--with` tokens, in order.
    pub plugins: Vec<Plugin>,

    /// Replacements accumulated from `--with` tokens carrying a
    /// `=replacement` part, in order.
    pub replacements: Vec<Replacement>,
}

/// Usage errors from the `build` argument grammar.
#[derive(Debug, thiserror::Error)]
pub enum ArgsError {
    /// A value-taking flag appeared as the last token.
    #[error("expected value after {flag} flag")]
    MissingValue { flag: &'static str },

    /// A second bare positional token; the version slot is already taken.
    #[error("missing flag; lattice version already set at {existing}")]
    DuplicateVersion { existing: String },

    #[error(transparent)]
    Plugin(#[from] PluginParseError),
}

/// Parse the tokens following `build`.
pub fn parse_build_args(args: &[String]) -> Result<BuildArgs, ArgsError> {
    let mut parsed = BuildArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--with" => {
                if i == args.len() - 1 {
                    return Err(ArgsError::MissingValue { flag: "--with" });
                }
                i += 1;
                let (module, version, replacement) = parse_plugin_token(&args[i])?;
                parsed.plugins.push(Plugin {
                    module: module.clone(),
                    version,
                });
                if !replacement.is_empty() {
                    parsed.replacements.push(Replacement {
                        target: module,
                        source: replacement,
                    });
                }
            }

            "--enable-cgo" => parsed.cgo_enabled = true,

            "--output" => {
                if i == args.len() - 1 {
                    return Err(ArgsError::MissingValue { flag: "--output" });
                }
                i += 1;
                parsed.output = args[i].clone();
            }

            token => {
                if !parsed.version.is_empty() {
                    return Err(ArgsError::DuplicateVersion {
                        existing: parsed.version.clone(),
                    });
                }
                parsed.version = token.to_string();
            }
        }
        i += 1;
    }

    Ok(parsed)
}
