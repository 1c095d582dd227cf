//! Pure placement geometry for crop, fit and mat layouts.
//!
//! All functions here are pure and testable without any I/O or images.
//! Intermediate pixel coordinates are rounded half away from zero
//! (`f64::round`).
//!
//! The planner trusts its caller: it will happily plan an upscale. Deciding
//! whether a plan is acceptable is the job of [`quality`](super::quality).

use crate::types::{LayoutMode, Rect, Size};
use serde::Serialize;

/// Where the source goes on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlacementPlan {
    /// Output dimensions; always equal to the target size.
    pub canvas_size: Size,
    /// Region of the source that is drawn.
    pub source_rect: Rect,
    /// Region of the canvas the source region is scaled into.
    pub dest_rect: Rect,
}

/// Compute the center-crop window of `source` matching the aspect ratio of `target`.
///
/// If the source is relatively wider, the full height is kept and the sides
/// are trimmed; otherwise the full width is kept and top/bottom are trimmed.
///
/// # Examples
/// ```
/// # use print_exporter::imaging::center_crop;
/// # use print_exporter::types::{Rect, Size};
/// let source = Size::new(4000, 3000).unwrap();
/// let target = Size::new(7200, 9000).unwrap();
/// assert_eq!(center_crop(source, target), Rect { x: 800, y: 0, w: 2400, h: 3000 });
/// ```
pub fn center_crop(source: Size, target: Size) -> Rect {
    let (src_w, src_h) = (source.width as f64, source.height as f64);
    let target_ratio = target.ratio();

    let rect = if source.ratio() > target_ratio {
        // Source is wider: keep full height, crop the sides
        let w = (src_h * target_ratio).round();
        Rect {
            x: ((src_w - w) / 2.0).round() as u32,
            y: 0,
            w: w as u32,
            h: source.height,
        }
    } else {
        // Source is taller (or equal): keep full width, crop top and bottom
        let h = (src_w / target_ratio).round();
        Rect {
            x: 0,
            y: ((src_h - h) / 2.0).round() as u32,
            w: source.width,
            h: h as u32,
        }
    };

    checked(rect, source, "crop window")
}

/// Mat border thickness in pixels for a target and percentage.
///
/// `round(min(width, height) * percent / 100)`.
pub fn mat_inset(target: Size, mat_percent: u32) -> u32 {
    let short_edge = target.width.min(target.height) as f64;
    (short_edge * mat_percent as f64 / 100.0).round() as u32
}

/// Size of the box the image is fitted into for `mode`.
///
/// For Crop and Fit this is the whole target; for Mat it is the target shrunk
/// by [`mat_inset`] on every side.
pub fn fitting_box(target: Size, mode: LayoutMode, mat_percent: u32) -> Size {
    match mode {
        LayoutMode::Mat => {
            let inset = mat_inset(target, mat_percent);
            Size {
                width: target.width.saturating_sub(2 * inset).max(1),
                height: target.height.saturating_sub(2 * inset).max(1),
            }
        }
        LayoutMode::Crop | LayoutMode::Fit => target,
    }
}

/// Scale factor that fits `source` entirely inside `bounds`.
pub fn fit_scale(source: Size, bounds: Size) -> f64 {
    let scale_w = bounds.width as f64 / source.width as f64;
    let scale_h = bounds.height as f64 / source.height as f64;
    scale_w.min(scale_h)
}

/// Scale `source` to fit inside `bounds` and center it on `canvas`.
fn centered_fit(source: Size, bounds: Size, canvas: Size) -> Rect {
    let scale = fit_scale(source, bounds);
    let draw_w = ((source.width as f64 * scale).round() as u32).max(1);
    let draw_h = ((source.height as f64 * scale).round() as u32).max(1);

    let rect = Rect {
        x: ((canvas.width as f64 - draw_w as f64) / 2.0).round().max(0.0) as u32,
        y: ((canvas.height as f64 - draw_h as f64) / 2.0).round().max(0.0) as u32,
        w: draw_w,
        h: draw_h,
    };

    checked(rect, canvas, "fitted image")
}

/// Plan how `source` is placed on a `target`-sized canvas.
pub fn plan(source: Size, target: Size, mode: LayoutMode, mat_percent: u32) -> PlacementPlan {
    let plan = match mode {
        LayoutMode::Crop => PlacementPlan {
            canvas_size: target,
            source_rect: center_crop(source, target),
            dest_rect: Rect::full(target),
        },
        LayoutMode::Fit | LayoutMode::Mat => PlacementPlan {
            canvas_size: target,
            source_rect: Rect::full(source),
            dest_rect: centered_fit(source, fitting_box(target, mode, mat_percent), target),
        },
    };

    log::debug!(
        "planned {mode} {source} -> {target}: src {:?} dst {:?}",
        plan.source_rect,
        plan.dest_rect
    );
    plan
}

/// Assert a rectangle lies within its bounds.
///
/// Out-of-bounds geometry is a planner bug, so debug builds panic. Release
/// builds clamp so a bad plan can never index outside a pixel buffer.
fn checked(rect: Rect, bounds: Size, what: &str) -> Rect {
    debug_assert!(
        rect.fits_within(bounds),
        "{what} {rect:?} exceeds bounds {bounds}"
    );
    let w = rect.w.min(bounds.width).max(1);
    let h = rect.h.min(bounds.height).max(1);
    Rect {
        x: rect.x.min(bounds.width - w),
        y: rect.y.min(bounds.height - h),
        w,
        h,
    }
}
