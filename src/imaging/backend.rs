//! Raster backend trait and shared types.
//!
//! The [`RasterBackend`] trait defines the two pixel operations every backend
//! must support: render a [`PlacementPlan`] onto a canvas, and encode that
//! canvas to PNG or JPEG bytes.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate. Tests use a recording mock.

use super::geometry::PlacementPlan;
use super::params::Quality;
use crate::types::{OutputFormat, Rgb, Size};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported source image: {0} (use a JPG or PNG image)")]
    UnsupportedSource(String),
    #[error("Failed to decode source image: {0}")]
    Decode(String),
    #[error("Source image has no pixels")]
    EmptySource,
    #[error(
        "Failed to generate {width}×{height} {} image: {message}. Try a smaller poster ratio.",
        .format.label()
    )]
    Encode {
        width: u32,
        height: u32,
        format: OutputFormat,
        message: String,
    },
    #[error("Failed to render {width}×{height} poster: {message}. Try a smaller poster ratio.")]
    Render {
        width: u32,
        height: u32,
        message: String,
    },
}

/// A decoded source photo. Read-only for the whole export run.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pixels: RgbImage,
    size: Size,
}

impl SourceImage {
    /// Wrap decoded RGB pixels, rejecting empty images.
    pub fn from_rgb(pixels: RgbImage) -> Result<Self, BackendError> {
        let size = Size::new(pixels.width(), pixels.height()).ok_or(BackendError::EmptySource)?;
        Ok(Self { pixels, size })
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Trait for raster backends.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait RasterBackend: Sync {
    /// Draw `plan.source_rect` of the source into `plan.dest_rect` of a new
    /// canvas of exactly `plan.canvas_size`. When `background` is set the
    /// canvas is filled with it first. A canvas the backend cannot allocate
    /// is a [`BackendError::Render`].
    fn render(
        &self,
        source: &SourceImage,
        plan: &PlacementPlan,
        background: Option<Rgb>,
    ) -> Result<RgbImage, BackendError>;

    /// Encode a canvas. Returns a non-empty byte stream or an
    /// [`BackendError::Encode`] naming the canvas dimensions.
    fn encode(
        &self,
        canvas: &RgbImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::{minimal_jfif_jpeg, minimal_png};
    use crate::types::Rect;
    use std::sync::Mutex;

    /// Mock backend that records operations without drawing anything.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        /// Canvas sizes whose encode call fails.
        pub fail_encode_for: Vec<Size>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Render {
            canvas: Size,
            source_rect: Rect,
            dest_rect: Rect,
            background: Option<Rgb>,
        },
        Encode {
            width: u32,
            height: u32,
            format: OutputFormat,
            quality: u8,
        },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing_encode(size: Size) -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                fail_encode_for: vec![size],
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl RasterBackend for MockBackend {
        fn render(
            &self,
            _source: &SourceImage,
            plan: &PlacementPlan,
            background: Option<Rgb>,
        ) -> Result<RgbImage, BackendError> {
            self.operations.lock().unwrap().push(RecordedOp::Render {
                canvas: plan.canvas_size,
                source_rect: plan.source_rect,
                dest_rect: plan.dest_rect,
                background,
            });
            Ok(RgbImage::new(
                plan.canvas_size.width,
                plan.canvas_size.height,
            ))
        }

        fn encode(
            &self,
            canvas: &RgbImage,
            format: OutputFormat,
            quality: Quality,
        ) -> Result<Vec<u8>, BackendError> {
            let (width, height) = canvas.dimensions();
            self.operations.lock().unwrap().push(RecordedOp::Encode {
                width,
                height,
                format,
                quality: quality.value(),
            });
            if self
                .fail_encode_for
                .iter()
                .any(|s| s.width == width && s.height == height)
            {
                return Err(BackendError::Encode {
                    width,
                    height,
                    format,
                    message: "mock encoder refused".into(),
                });
            }
            Ok(match format {
                OutputFormat::Png => minimal_png(1),
                OutputFormat::Jpeg => minimal_jfif_jpeg(),
            })
        }
    }

    #[test]
    fn source_image_rejects_empty() {
        assert!(matches!(
            SourceImage::from_rgb(RgbImage::new(0, 10)),
            Err(BackendError::EmptySource)
        ));
    }

    #[test]
    fn mock_records_render_and_encode() {
        let backend = MockBackend::new();
        let source = SourceImage::from_rgb(RgbImage::new(40, 30)).unwrap();
        let plan = crate::imaging::geometry::plan(
            source.size(),
            Size::new(20, 20).unwrap(),
            crate::types::LayoutMode::Crop,
            5,
        );
        let canvas = backend.render(&source, &plan, None).unwrap();
        assert_eq!(canvas.dimensions(), (20, 20));
        backend
            .encode(&canvas, OutputFormat::Jpeg, Quality::new(80))
            .unwrap();

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[0],
            RecordedOp::Render { source_rect: Rect { x: 5, y: 0, w: 30, h: 30 }, .. }
        ));
        assert!(matches!(
            &ops[1],
            RecordedOp::Encode {
                width: 20,
                height: 20,
                format: OutputFormat::Jpeg,
                quality: 80
            }
        ));
    }

    #[test]
    fn encode_error_names_dimensions() {
        let err = BackendError::Encode {
            width: 7200,
            height: 10800,
            format: OutputFormat::Png,
            message: "out of memory".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("7200×10800"), "{msg}");
        assert!(msg.contains("PNG"), "{msg}");
    }

    #[test]
    fn render_error_names_no_format() {
        let err = BackendError::Render {
            width: 7200,
            height: 10800,
            message: "canvas exceeds the supported size".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("7200×10800"), "{msg}");
        assert!(!msg.contains("PNG") && !msg.contains("JPEG"), "{msg}");
    }
}
