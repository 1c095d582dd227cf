//! # Print Exporter
//!
//! Turns one photo into a ZIP of print-ready posters at standard aspect
//! ratios. Every poster has exact pixel dimensions for a 300 DPI print and
//! carries that resolution in its file metadata, so print shops and layout
//! software size it correctly without asking.
//!
//! # Architecture: Plan, Gate, Render, Stamp, Package
//!
//! ```text
//! source.jpg
//!   │  decode (JPEG / PNG only)
//!   ▼
//! targets ── quality gate ──▶ skipped (would need upscaling)
//!   │
//!   ▼  per target, in parallel
//! plan (crop / fit / mat) → render → encode PNG, JPEG → stamp 300 DPI
//!   │
//!   ▼  in selection order
//! {name}_posters.zip
//! ```
//!
//! Each step is a separate module with pure inputs and outputs, so the
//! geometry, the gate and the byte-level DPI patching are tested without
//! encoding a single real image, and the pipeline is tested against a
//! recording mock backend.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Placement geometry, quality gate, `image`-crate rendering, DPI injection |
//! | [`export`] | The pipeline: validation, gating, parallel rendering, progress, archiving |
//! | [`archive`] | ZIP packaging behind the [`archive::Archiver`] trait |
//! | [`presets`] | Standard poster sizes (2:3, ISO A1, 4:5, 3:4, 11:14) in both orientations |
//! | [`naming`] | Export name sanitizing and artifact/archive filenames |
//! | [`preview`] | Thumbnail geometry for showing a crop or a fit before exporting |
//! | [`config`] | `print-exporter.toml` loading, merging over defaults, and validation |
//! | [`types`] | Shared value types (`Size`, `Rect`, `TargetSpec`, ...) |
//! | [`output`] | CLI output formatting: progress lines, plans, ratio lists |
//!
//! # Design Decisions
//!
//! ## Never Upscale
//!
//! A poster that needs more pixels than the photo has is skipped, not
//! enlarged. Interpolated pixels look soft in print, and a missing size is
//! easier to notice and fix than a blurry one. The skip is reported with the
//! usable crop size so the user knows how far off the photo is.
//!
//! ## Metadata by Byte Patching
//!
//! The encoders write pixels; the 300 DPI stamp is added afterwards by
//! inserting a PNG `pHYs` chunk or patching the JPEG JFIF density fields.
//! Metadata is cosmetic: a stream with an unexpected layout is returned
//! unchanged rather than failing the export.
//!
//! ## All or Nothing
//!
//! Any encoder or archive failure aborts the run. A ZIP is only produced when
//! every requested poster was rendered, and it is written under a temporary
//! name and renamed into place.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding all use the `image` crate. The
//! binary has no system dependencies.

pub mod archive;
pub mod config;
pub mod export;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod presets;
pub mod preview;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
