//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Source
//!
//! ```text
//! Source: sunset.jpg
//!     6000 × 4000 px (3 : 2, landscape)
//!     8.4 MB
//! ```
//!
//! ## Export
//!
//! ```text
//! [  0%] Starting export (4 files)…
//! [  0%] Processing 2:3 Landscape PNG (10800×7200)…
//!     sunset_36x24_landscape.png (61.2 MB)
//! [ 90%] Creating ZIP archive…
//! [100%] Done!
//! ```
//!
//! ## Plan
//!
//! ```text
//! sunset_posters.zip (PNG, JPEG)
//! 001 2:3 Landscape 10800×7200 crop
//!     Source: 6000×4000 at (0, 0)
//!     sunset_36x24_landscape.png
//!     sunset_36x24_landscape.jpg
//!
//! Skipped
//!     A1 Landscape — The source image is smaller than 9,933 × 7,016 px. …
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::export::{ExportEvent, ExportOutcome, ExportPlan};
use crate::presets::{Orientation, RATIO_GROUPS};
use crate::types::{LayoutMode, Size, SkipRecord};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Reduce `w : h` to lowest terms.
///
/// When either term is still above 50 the exact ratio is unreadable, so a
/// decimal approximation is shown instead.
///
/// ```text
/// 6000 × 4000 → "3 : 2"
/// 1920 × 1080 → "16 : 9"
/// 4032 × 2268 → "16 : 9"
/// 1001 × 1000 → "≈ 1.00 : 1"
/// ```
pub fn simplify_ratio(size: Size) -> String {
    let g = gcd(size.width, size.height).max(1);
    let (rw, rh) = (size.width / g, size.height / g);
    if rw > 50 || rh > 50 {
        format!("≈ {:.2} : 1", size.ratio())
    } else {
        format!("{rw} : {rh}")
    }
}

/// Human-readable byte count: `B`, `KB` or `MB` with one decimal.
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// `7200` → `"7,200"`
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ============================================================================
// Source info
// ============================================================================

/// Describe the loaded source photo.
pub fn format_source_info(
    filename: &str,
    size: Size,
    file_bytes: Option<u64>,
) -> Vec<String> {
    let mut lines = vec![format!("Source: {filename}")];
    lines.push(format!(
        "{}{} × {} px ({}, {})",
        indent(1),
        size.width,
        size.height,
        simplify_ratio(size),
        Orientation::of(size)
    ));
    if let Some(bytes) = file_bytes {
        lines.push(format!("{}{}", indent(1), format_bytes(bytes)));
    }
    lines
}

pub fn print_source_info(path: &Path, size: Size) {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let bytes = std::fs::metadata(path).ok().map(|m| m.len());
    for line in format_source_info(&filename, size, bytes) {
        println!("{}", line);
    }
}

/// Warning shown when exporting the orientation the photo is not.
pub fn format_orientation_warning(detected: Orientation, chosen: Orientation) -> Option<String> {
    if detected == chosen {
        return None;
    }
    let chosen = chosen.to_string();
    let mut capitalized = chosen[..1].to_uppercase();
    capitalized.push_str(&chosen[1..]);
    Some(format!(
        "Your image is {detected}-oriented. {capitalized} sizes may require upscaling, which can reduce print quality."
    ))
}

// ============================================================================
// Export progress
// ============================================================================

/// One line per skipped target.
pub fn format_skipped(record: &SkipRecord) -> String {
    format!(
        "{} — The source image is smaller than {} × {} px. This size was skipped to avoid quality loss. (usable crop: {} × {} px)",
        record.target.label,
        group_thousands(record.required_size.width),
        group_thousands(record.required_size.height),
        group_thousands(record.achievable_crop_size.width),
        group_thousands(record.achievable_crop_size.height),
    )
}

/// Format a single export event as display lines.
pub fn format_export_event(event: &ExportEvent) -> Vec<String> {
    match event {
        ExportEvent::Skipped(record) => vec![format!("Skipped: {}", format_skipped(record))],
        ExportEvent::Progress { percent, message } => {
            vec![format!("[{:>3}%] {}", percent, message)]
        }
        ExportEvent::ArtifactReady { filename, bytes } => vec![format!(
            "{}{} ({})",
            indent(1),
            filename,
            format_bytes(*bytes as u64)
        )],
    }
}

/// Summary after a successful export.
pub fn format_export_outcome(outcome: &ExportOutcome, saved_to: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "Exported {} file{} → {} ({})",
        outcome.files.len(),
        if outcome.files.len() == 1 { "" } else { "s" },
        saved_to.display(),
        format_bytes(outcome.archive.bytes.len() as u64)
    )];
    if !outcome.skipped.is_empty() {
        lines.push(format!(
            "{}{} size{} skipped (source too small)",
            indent(1),
            outcome.skipped.len(),
            if outcome.skipped.len() == 1 { "" } else { "s" }
        ));
    }
    lines
}

pub fn print_export_outcome(outcome: &ExportOutcome, saved_to: &Path) {
    for line in format_export_outcome(outcome, saved_to) {
        println!("{}", line);
    }
}

// ============================================================================
// Plan (dry run)
// ============================================================================

/// Format the dry-run plan: what would be written, and what is skipped.
pub fn format_plan(plan: &ExportPlan) -> Vec<String> {
    let formats: Vec<&str> = plan.formats.iter().map(|f| f.label()).collect();
    let mut lines = vec![format!(
        "{} ({})",
        plan.archive_filename,
        formats.join(", ")
    )];

    for (i, planned) in plan.targets.iter().enumerate() {
        let t = &planned.target;
        let mut header = format!(
            "{} {} {} {}",
            format_index(i + 1),
            t.label,
            t.size,
            t.mode
        );
        if t.mode == LayoutMode::Mat {
            header.push_str(&format!(" {}%", t.mat_percent));
        }
        if t.mode.fills_background() {
            header.push_str(&format!(" on {}", t.background));
        }
        lines.push(header);

        let src = planned.placement.source_rect;
        let dst = planned.placement.dest_rect;
        lines.push(format!(
            "{}Source: {}×{} at ({}, {})",
            indent(1),
            src.w,
            src.h,
            src.x,
            src.y
        ));
        if t.mode.fills_background() {
            lines.push(format!(
                "{}Placed: {}×{} at ({}, {})",
                indent(1),
                dst.w,
                dst.h,
                dst.x,
                dst.y
            ));
        }
        for filename in &planned.filenames {
            lines.push(format!("{}{}", indent(1), filename));
        }
    }

    if !plan.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for record in &plan.skipped {
            lines.push(format!("{}{}", indent(1), format_skipped(record)));
        }
    }
    lines
}

pub fn print_plan(plan: &ExportPlan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

// ============================================================================
// Ratios
// ============================================================================

/// List every preset ratio group with both orientations.
pub fn format_ratios() -> Vec<String> {
    let mut lines = Vec::new();
    for group in RATIO_GROUPS {
        lines.push(format!("{:<7} {}", group.id, group.group_label));
        for preset in [&group.portrait, &group.landscape] {
            lines.push(format!(
                "{}{:<16} {:>5} × {:<5} px  {}",
                indent(1),
                preset.label,
                preset.width,
                preset.height,
                preset.name
            ));
        }
    }
    lines
}

pub fn print_ratios() {
    for line in format_ratios() {
        println!("{}", line);
    }
}
