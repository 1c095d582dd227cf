//! Thumbnail preview geometry.
//!
//! A preview is a small stand-in for one target, drawn by whatever front end
//! is showing the ratio list (`plan --json` carries one per target). It
//! reuses the export plan, scaled down:
//!
//! - **Crop**: the whole source at thumbnail size with the kept region marked,
//!   so the front end can draw the source dimmed and the kept region bright.
//! - **Fit / Mat**: a canvas at the target's aspect ratio with the image
//!   rectangle inside it; the rest is background.
//!
//! Nothing here touches pixels.

use crate::imaging::geometry::{PlacementPlan, plan};
use crate::types::{LayoutMode, Rect, Rgb, Size, TargetSpec};
use serde::Serialize;

/// Longest edge of the per-ratio thumbnail carried in every export plan.
pub const CARD_MAX_DIM: u32 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Preview {
    /// Whole source scaled to `frame`; `kept` is the crop window in the same
    /// coordinates.
    Crop { frame: Size, kept: Rect },
    /// Poster canvas scaled to `frame`; `image` is where the photo lands.
    Canvas {
        frame: Size,
        image: Rect,
        background: Rgb,
    },
}

impl Preview {
    pub fn frame(&self) -> Size {
        match self {
            Preview::Crop { frame, .. } | Preview::Canvas { frame, .. } => *frame,
        }
    }
}

/// Preview geometry for `target` with the longest edge at most `max_dim`.
pub fn preview(source: Size, target: &TargetSpec, max_dim: u32) -> Preview {
    match target.mode {
        LayoutMode::Crop => {
            let scale = scale_to(source, max_dim);
            let crop = plan(source, target.size, LayoutMode::Crop, target.mat_percent);
            let frame = scale_size(source, scale);
            let mut kept = scale_rect(crop.source_rect, scale);
            // Independent rounding of offset and extent can overshoot by a pixel
            kept.x = kept.x.min(frame.width - 1);
            kept.y = kept.y.min(frame.height - 1);
            kept.w = kept.w.clamp(1, frame.width - kept.x);
            kept.h = kept.h.clamp(1, frame.height - kept.y);
            Preview::Crop { frame, kept }
        }
        LayoutMode::Fit | LayoutMode::Mat => {
            let frame = scale_size(target.size, scale_to(target.size, max_dim));
            let PlacementPlan { dest_rect, .. } =
                plan(source, frame, target.mode, target.mat_percent);
            Preview::Canvas {
                frame,
                image: dest_rect,
                background: target.background,
            }
        }
    }
}

fn scale_to(size: Size, max_dim: u32) -> f64 {
    let max_dim = max_dim.max(1) as f64;
    (max_dim / size.width as f64).min(max_dim / size.height as f64)
}

fn scale_size(size: Size, scale: f64) -> Size {
    Size {
        width: ((size.width as f64 * scale).round() as u32).max(1),
        height: ((size.height as f64 * scale).round() as u32).max(1),
    }
}

fn scale_rect(rect: Rect, scale: f64) -> Rect {
    let s = |v: u32| (v as f64 * scale).round() as u32;
    Rect {
        x: s(rect.x),
        y: s(rect.y),
        w: s(rect.w),
        h: s(rect.h),
    }
}
