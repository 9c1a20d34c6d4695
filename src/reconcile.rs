//! Replacement reconciliation for dev builds.
//!
//! Replace directives only apply to the top-level module manifest, and
//! the scratch module the builder writes becomes that top level. The
//! workspace's own directives therefore have to be carried through into
//! the descriptor, behind the synthesized self-replacement that makes
//! the locally edited source win.

use crate::descriptor::Replacement;

/// Separator used by the toolchain's replace-directive listing.
const SEPARATOR: &str = "=>";

/// Build the final replacement list for a dev build.
///
/// The result always starts with `{current_module => module_dir}`, so the
/// local working tree, not any published version, is what gets built.
/// Well-formed workspace lines follow in source order. A line is
/// well-formed when it has exactly one `=>` and both sides are non-blank
/// after trimming; anything else is silently skipped. Targets are
/// deduplicated keep-first, so at most one directive per target survives
/// and the synthesized entry cannot be shadowed.
pub fn reconcile_replacements(
    current_module: &str,
    module_dir: &str,
    lines: &str,
) -> Vec<Replacement> {
    let mut replacements = vec![Replacement {
        target: current_module.to_string(),
        source: module_dir.to_string(),
    }];

    for line in lines.lines() {
        let parts: Vec<&str> = line.split(SEPARATOR).collect();
        if parts.len() != 2 {
            continue;
        }
        let (target, source) = (parts[0].trim(), parts[1].trim());
        if target.is_empty() || source.is_empty() {
            continue;
        }
        if replacements.iter().any(|r| r.target == target) {
            continue;
        }
        replacements.push(Replacement {
            target: target.to_string(),
            source: source.to_string(),
        });
    }

    replacements
}
