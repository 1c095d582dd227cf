//! Pure Rust raster backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode source (JPEG, PNG) | `image::ImageReader` with content sniffing |
//! | Resample | `image::imageops::resize` with `Lanczos3` filter |
//! | Composite | `image::imageops::replace` (opaque overwrite) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (writes a JFIF APP0 header) |

use super::backend::{BackendError, RasterBackend, SourceImage};
use super::geometry::PlacementPlan;
use super::params::Quality;
use crate::types::{OutputFormat, Rgb};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader, RgbImage};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;

/// Largest canvas area the backend will allocate (16384 × 16384).
pub const MAX_CANVAS_PIXELS: u64 = 16_384 * 16_384;

/// Source formats accepted as input.
const SOURCE_FORMATS: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// Decode a JPEG or PNG file from disk.
///
/// The format is sniffed from the file content, falling back to the
/// extension. Anything else is rejected with [`BackendError::UnsupportedSource`].
pub fn open_source(path: &Path) -> Result<SourceImage, BackendError> {
    let reader = ImageReader::open(path)?;
    decode_source(reader, &path.display().to_string())
}

/// Decode a JPEG or PNG from memory.
pub fn decode_source_bytes(bytes: &[u8]) -> Result<SourceImage, BackendError> {
    decode_source(ImageReader::new(Cursor::new(bytes)), "<memory>")
}

fn decode_source<R: BufRead + Seek>(
    reader: ImageReader<R>,
    name: &str,
) -> Result<SourceImage, BackendError> {
    let reader = reader.with_guessed_format()?;
    match reader.format() {
        Some(format) if SOURCE_FORMATS.contains(&format) => {}
        Some(format) => {
            return Err(BackendError::UnsupportedSource(format!(
                "{name} is {format:?}"
            )));
        }
        None => {
            return Err(BackendError::UnsupportedSource(format!(
                "{name} is not a recognised image"
            )));
        }
    }
    let img = reader
        .decode()
        .map_err(|e| BackendError::Decode(format!("{name}: {e}")))?;
    SourceImage::from_rgb(img.to_rgb8())
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    filter: FilterType,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend for RustBackend {
    fn render(
        &self,
        source: &SourceImage,
        plan: &PlacementPlan,
        background: Option<Rgb>,
    ) -> Result<RgbImage, BackendError> {
        let canvas_size = plan.canvas_size;
        let area = canvas_size.width as u64 * canvas_size.height as u64;
        if area > MAX_CANVAS_PIXELS {
            return Err(BackendError::Render {
                width: canvas_size.width,
                height: canvas_size.height,
                message: "canvas exceeds the supported size".into(),
            });
        }

        let mut canvas = match background {
            Some(color) => RgbImage::from_pixel(
                canvas_size.width,
                canvas_size.height,
                image::Rgb(color.to_array()),
            ),
            None => RgbImage::new(canvas_size.width, canvas_size.height),
        };

        let src = plan.source_rect;
        let dst = plan.dest_rect;
        let region = imageops::crop_imm(source.pixels(), src.x, src.y, src.w, src.h);

        let scaled = if (src.w, src.h) == (dst.w, dst.h) {
            region.to_image()
        } else {
            imageops::resize(&*region, dst.w, dst.h, self.filter)
        };
        imageops::replace(&mut canvas, &scaled, dst.x as i64, dst.y as i64);

        Ok(canvas)
    }

    fn encode(
        &self,
        canvas: &RgbImage,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let (width, height) = canvas.dimensions();
        let mut bytes = Vec::new();

        let result = match format {
            OutputFormat::Png => PngEncoder::new(&mut bytes).write_image(
                canvas.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            ),
            OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut bytes, quality.value())
                .write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgb8),
        };

        let encode_error = |message: String| BackendError::Encode {
            width,
            height,
            format,
            message,
        };
        result.map_err(|e| encode_error(e.to_string()))?;
        if bytes.is_empty() {
            return Err(encode_error("encoder produced no data".into()));
        }
        Ok(bytes)
    }
}
