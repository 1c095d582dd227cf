//! Filename rules for exported posters.
//!
//! Every name the exporter writes starts from one export base name:
//!
//! - `Sunset at Beach.jpg` → base name `Sunset_at_Beach`
//! - artifact: `Sunset_at_Beach_24x30_portrait_mat.png`
//! - archive: `Sunset_at_Beach_posters.zip`
//!
//! The base name keeps `[A-Za-z0-9_-]`. Everything else becomes `_`, runs of
//! underscores collapse to one, and an empty result becomes `poster`.

use crate::types::{OutputFormat, TargetSpec};
use std::path::Path;

/// Base name used when nothing usable is left after sanitizing.
pub const FALLBACK_NAME: &str = "poster";

/// Sanitize a user-supplied export name.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    if out.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        out
    }
}

/// Default export name for a source file: its stem, sanitized.
pub fn export_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    sanitize(&stem)
}

/// `{name}_{tag}{mode_suffix}.{ext}`
pub fn artifact_filename(export_name: &str, target: &TargetSpec, format: OutputFormat) -> String {
    format!(
        "{}_{}{}.{}",
        export_name,
        target.filename_tag,
        target.mode.filename_suffix(),
        format.extension()
    )
}

/// `{name}_posters.zip`
pub fn archive_filename(export_name: &str) -> String {
    format!("{export_name}_posters.zip")
}
