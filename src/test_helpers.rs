//! Shared test utilities for the print-exporter test suite.
//!
//! Builders for target specs and synthetic sources, plus byte-level helpers
//! for the PNG and JPEG streams the DPI injector works on.

use crate::imaging::SourceImage;
use crate::imaging::dpi::crc32;
use crate::types::{LayoutMode, Rgb, Size, TargetSpec};
use image::RgbImage;

// =========================================================================
// Targets and sources
// =========================================================================

/// A target with the given id, size and mode; tag and label derive from the id.
pub fn target(id: &str, width: u32, height: u32, mode: LayoutMode) -> TargetSpec {
    TargetSpec {
        id: id.to_string(),
        label: format!("{id} label"),
        filename_tag: format!("{id}_tag"),
        size: Size::new(width, height).unwrap(),
        mode,
        mat_percent: 5,
        background: Rgb::BLACK,
    }
}

/// A gradient source image of the given size.
pub fn gradient_source(width: u32, height: u32) -> SourceImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    SourceImage::from_rgb(img).unwrap()
}

/// A single-color source image.
pub fn solid_source(width: u32, height: u32, color: [u8; 3]) -> SourceImage {
    SourceImage::from_rgb(RgbImage::from_pixel(width, height, image::Rgb(color))).unwrap()
}

// =========================================================================
// PNG byte helpers
// =========================================================================

fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    let mut crc_input = kind.to_vec();
    crc_input.extend_from_slice(data);
    out.extend_from_slice(&crc32(&crc_input).to_be_bytes());
}

/// A structurally valid PNG chunk stream with `idat_count` IDAT chunks.
///
/// The IDAT payloads are placeholders; only the chunk framing matters to the
/// DPI injector.
pub fn minimal_png(idat_count: usize) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
    // 1x1, 8-bit RGB
    push_chunk(&mut out, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]);
    push_chunk(&mut out, b"sRGB", &[0]);
    for i in 0..idat_count {
        push_chunk(&mut out, b"IDAT", &[0x78, 0x9C, i as u8, 0xFF]);
    }
    push_chunk(&mut out, b"IEND", &[]);
    out
}

/// One parsed PNG chunk.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub kind: [u8; 4],
    pub data: Vec<u8>,
    /// Stored CRC matches CRC-32 of type + data.
    pub crc_ok: bool,
}

/// Parse a PNG byte stream into chunks. Panics on malformed input.
pub fn png_chunks(png: &[u8]) -> Vec<Chunk> {
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n", "missing PNG signature");
    let mut chunks = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        let data = png[pos + 8..pos + 8 + len].to_vec();
        let stored = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        chunks.push(Chunk {
            kind,
            crc_ok: stored == crc32(&png[pos + 4..pos + 8 + len]),
            data,
        });
        pos += 12 + len;
    }
    chunks
}

// =========================================================================
// JPEG byte helpers
// =========================================================================

/// SOI + JFIF 1.01 APP0 (no density units, 1:1) + EOI.
pub fn minimal_jfif_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x10, // APP0, length 16
        b'J', b'F', b'I', b'F', 0x00, // identifier
        0x01, 0x01, // version
        0x00, // units
        0x00, 0x01, 0x00, 0x01, // density
        0x00, 0x00, // thumbnail
        0xFF, 0xD9, // EOI
    ]
}
