//! Upscale prevention.
//!
//! Cropping discards pixels and is never a quality problem. Enlarging is:
//! a target is only achievable when every output pixel comes from at least
//! one source pixel. The check is mode-aware:
//!
//! - **Crop**: the center-crop window must be at least as large as the target
//!   on both axes.
//! - **Fit / Mat**: nothing is cropped, so the fit scale against the full
//!   target must not exceed 1.

use super::geometry::{center_crop, fit_scale};
use crate::types::{LayoutMode, Size, SkipRecord, TargetSpec};

/// Outcome of gating one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateResult {
    /// The target renders at this size without enlarging source pixels.
    Achievable(Size),
    /// The target would need upscaling.
    Skipped(SkipRecord),
}

impl GateResult {
    pub fn is_achievable(&self) -> bool {
        matches!(self, GateResult::Achievable(_))
    }
}

/// Decide whether `target` can be produced from a `source`-sized image.
pub fn check(source: Size, target: &TargetSpec) -> GateResult {
    let required = target.size;

    let achievable = match target.mode {
        LayoutMode::Crop => {
            let crop = center_crop(source, required);
            if crop.w < required.width || crop.h < required.height {
                Err(crop.size())
            } else {
                Ok(())
            }
        }
        LayoutMode::Fit | LayoutMode::Mat => {
            if fit_scale(source, required) > 1.0 {
                Err(source)
            } else {
                Ok(())
            }
        }
    };

    match achievable {
        Ok(()) => GateResult::Achievable(required),
        Err(achievable_crop_size) => {
            log::debug!(
                "{} ({}) needs {required}, source offers {achievable_crop_size}",
                target.label,
                target.mode
            );
            GateResult::Skipped(SkipRecord {
                target: target.clone(),
                required_size: required,
                achievable_crop_size,
            })
        }
    }
}

/// Gate every target, keeping selection order within each partition.
pub fn partition(source: Size, targets: &[TargetSpec]) -> (Vec<TargetSpec>, Vec<SkipRecord>) {
    let mut allowed = Vec::new();
    let mut skipped = Vec::new();
    for target in targets {
        match check(source, target) {
            GateResult::Achievable(_) => allowed.push(target.clone()),
            GateResult::Skipped(record) => skipped.push(record),
        }
    }
    (allowed, skipped)
}
