//! High-level image operations.
//!
//! These functions combine geometry, the backend and DPI injection. They take
//! a target, compute the plan, and drive the backend; the export pipeline
//! decides which targets and formats to run them for.

use super::backend::{BackendError, RasterBackend, SourceImage};
use super::dpi::embed_dpi;
use super::geometry::{PlacementPlan, plan};
use super::params::EncodeSettings;
use crate::types::{OutputArtifact, OutputFormat, TargetSpec};
use image::RgbImage;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan a target without rendering it.
pub fn plan_target(source: &SourceImage, target: &TargetSpec) -> PlacementPlan {
    plan(source.size(), target.size, target.mode, target.mat_percent)
}

/// Render one target's canvas.
///
/// The background is only applied for layouts that leave canvas uncovered.
pub fn render_target(
    backend: &impl RasterBackend,
    source: &SourceImage,
    target: &TargetSpec,
) -> Result<RgbImage> {
    let placement = plan_target(source, target);
    let background = target.mode.fills_background().then_some(target.background);
    backend.render(source, &placement, background)
}

/// Encode a rendered canvas and stamp its DPI.
pub fn encode_artifact(
    backend: &impl RasterBackend,
    canvas: &RgbImage,
    format: OutputFormat,
    filename: String,
    settings: &EncodeSettings,
) -> Result<OutputArtifact> {
    let encoded = backend.encode(canvas, format, settings.jpeg_quality)?;
    let bytes = embed_dpi(encoded, format, settings.dpi);
    log::debug!("encoded {filename} ({} bytes)", bytes.len());
    Ok(OutputArtifact {
        filename,
        bytes,
        mime_type: format.mime_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::Quality;
    use crate::test_helpers::{gradient_source, png_chunks, target};
    use crate::types::{LayoutMode, Rect, Rgb, Size};

    #[test]
    fn crop_render_passes_no_background() {
        let backend = MockBackend::new();
        let mut t = target("4x5", 40, 50, LayoutMode::Crop);
        t.background = Rgb::WHITE;
        render_target(&backend, &gradient_source(100, 100), &t).unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                background: None,
                source_rect: Rect { x: 10, y: 0, w: 80, h: 100 },
                ..
            }
        ));
    }

    #[test]
    fn fit_render_passes_background() {
        let backend = MockBackend::new();
        let mut t = target("4x5", 40, 50, LayoutMode::Fit);
        t.background = Rgb::WHITE;
        render_target(&backend, &gradient_source(100, 100), &t).unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Render {
                background: Some(Rgb::WHITE),
                canvas: Size { width: 40, height: 50 },
                ..
            }
        ));
    }

    #[test]
    fn encode_artifact_embeds_dpi() {
        let backend = MockBackend::new();
        let canvas = RgbImage::new(10, 10);
        let settings = EncodeSettings {
            jpeg_quality: Quality::new(75),
            dpi: 300,
        };

        let png = encode_artifact(&backend, &canvas, OutputFormat::Png, "a.png".into(), &settings)
            .unwrap();
        assert_eq!(png.mime_type, "image/png");
        assert!(png_chunks(&png.bytes).iter().any(|c| c.kind == *b"pHYs"));

        let jpeg =
            encode_artifact(&backend, &canvas, OutputFormat::Jpeg, "a.jpg".into(), &settings)
                .unwrap();
        assert_eq!(jpeg.mime_type, "image/jpeg");
        assert_eq!(&jpeg.bytes[13..18], &[1, 0x01, 0x2C, 0x01, 0x2C]);

        assert!(matches!(
            backend.get_operations()[1],
            RecordedOp::Encode { quality: 75, .. }
        ));
    }

    #[test]
    fn encode_failure_propagates() {
        let backend = MockBackend::failing_encode(Size::new(10, 10).unwrap());
        let canvas = RgbImage::new(10, 10);
        let result = encode_artifact(
            &backend,
            &canvas,
            OutputFormat::Png,
            "a.png".into(),
            &EncodeSettings::default(),
        );
        assert!(matches!(result, Err(BackendError::Encode { width: 10, height: 10, .. })));
    }
}
