//! Physical resolution (DPI) injection for encoded PNG and JPEG files.
//!
//! Works on the final encoded bytes only; pixel data is never decoded or
//! re-encoded.
//!
//! - **PNG**: a `pHYs` chunk (pixels per meter) is spliced in immediately
//!   before the first `IDAT` chunk.
//! - **JPEG**: the density fields of the JFIF APP0 segment are patched in
//!   place.
//!
//! Metadata is cosmetic. Any unexpected layout (no `IDAT`, no JFIF header,
//! truncated chunk) returns the input unchanged rather than failing.

use crate::types::OutputFormat;
use std::sync::LazyLock;

/// DPI written into every exported poster.
pub const PRINT_DPI: u16 = 300;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const IDAT: &[u8; 4] = b"IDAT";
const PHYS: &[u8; 4] = b"pHYs";
/// Length prefix + type + CRC around each chunk's data.
const CHUNK_OVERHEAD: usize = 12;
/// Length of a complete `pHYs` chunk: 4 + 4 + 9 + 4.
pub const PHYS_CHUNK_LEN: usize = 21;
const METERS_PER_INCH: f64 = 0.0254;

/// JFIF header: SOI, APP0 marker, 2-byte length, then the identifier.
const JFIF_ID: &[u8] = b"JFIF";
const JFIF_ID_OFFSET: usize = 6;
const JFIF_UNITS_OFFSET: usize = 13;
const JFIF_X_DENSITY_OFFSET: usize = 14;
const JFIF_Y_DENSITY_OFFSET: usize = 16;
const JFIF_MIN_LEN: usize = 18;
const UNITS_DOTS_PER_INCH: u8 = 1;

/// Set the physical resolution of an encoded image.
pub fn embed_dpi(bytes: Vec<u8>, format: OutputFormat, dpi: u16) -> Vec<u8> {
    match format {
        OutputFormat::Png => embed_png_dpi(bytes, dpi),
        OutputFormat::Jpeg => embed_jpeg_dpi(bytes, dpi),
    }
}

// ---------------------------------------------------------------------------
// PNG: pHYs chunk
// ---------------------------------------------------------------------------

/// Convert dots per inch to PNG pixels per meter (300 → 11811).
pub fn pixels_per_meter(dpi: u16) -> u32 {
    (dpi as f64 / METERS_PER_INCH).round() as u32
}

/// Insert a `pHYs` chunk before the first `IDAT`.
///
/// Running this twice inserts a second chunk; existing `pHYs` chunks are not
/// looked for or replaced.
pub fn embed_png_dpi(bytes: Vec<u8>, dpi: u16) -> Vec<u8> {
    let Some(insert_at) = find_first_idat(&bytes) else {
        log::warn!("no IDAT chunk found; PNG left without DPI metadata");
        return bytes;
    };

    let ppm = pixels_per_meter(dpi);
    let chunk = build_phys_chunk(ppm, ppm);

    let mut out = Vec::with_capacity(bytes.len() + chunk.len());
    out.extend_from_slice(&bytes[..insert_at]);
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&bytes[insert_at..]);
    out
}

/// Offset of the first `IDAT` chunk's length field.
///
/// Chunk layout:
///   Bytes 0-3:  Data length (big-endian u32)
///   Bytes 4-7:  Chunk type (ASCII)
///   Bytes 8+:   Data
///   Last 4:     CRC-32 of type + data
fn find_first_idat(data: &[u8]) -> Option<usize> {
    let mut pos = PNG_SIGNATURE.len();

    while pos + 8 <= data.len() {
        if &data[pos + 4..pos + 8] == IDAT {
            return Some(pos);
        }
        let length =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos = pos.checked_add(CHUNK_OVERHEAD + length)?;
    }
    None
}

/// Build a complete 21-byte `pHYs` chunk with unit = meter.
pub fn build_phys_chunk(ppm_x: u32, ppm_y: u32) -> [u8; PHYS_CHUNK_LEN] {
    let mut chunk = [0u8; PHYS_CHUNK_LEN];
    chunk[0..4].copy_from_slice(&9u32.to_be_bytes());
    chunk[4..8].copy_from_slice(PHYS);
    chunk[8..12].copy_from_slice(&ppm_x.to_be_bytes());
    chunk[12..16].copy_from_slice(&ppm_y.to_be_bytes());
    chunk[16] = 1; // unit: meter
    let crc = crc32(&chunk[4..17]);
    chunk[17..21].copy_from_slice(&crc.to_be_bytes());
    chunk
}

static CRC_TABLE: LazyLock<[u32; 256]> = LazyLock::new(|| {
    let mut table = [0u32; 256];
    for (n, entry) in table.iter_mut().enumerate() {
        let mut c = n as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
        }
        *entry = c;
    }
    table
});

/// CRC-32 as used by PNG (ISO 3309, reflected polynomial `0xEDB88320`).
pub fn crc32(bytes: &[u8]) -> u32 {
    let table = &*CRC_TABLE;
    let crc = bytes.iter().fold(0xFFFF_FFFFu32, |crc, &b| {
        table[((crc ^ b as u32) & 0xFF) as usize] ^ (crc >> 8)
    });
    crc ^ 0xFFFF_FFFF
}

// ---------------------------------------------------------------------------
// JPEG: JFIF APP0 density fields
// ---------------------------------------------------------------------------

/// Patch the JFIF density fields to `dpi` dots per inch.
///
/// Only bytes 13–17 change. Streams without a leading JFIF APP0 segment
/// (e.g. EXIF-first encoders) are returned untouched.
pub fn embed_jpeg_dpi(mut bytes: Vec<u8>, dpi: u16) -> Vec<u8> {
    if !has_jfif_header(&bytes) {
        log::warn!("no JFIF APP0 header; JPEG left without DPI metadata");
        return bytes;
    }

    let density = dpi.to_be_bytes();
    bytes[JFIF_UNITS_OFFSET] = UNITS_DOTS_PER_INCH;
    bytes[JFIF_X_DENSITY_OFFSET..JFIF_X_DENSITY_OFFSET + 2].copy_from_slice(&density);
    bytes[JFIF_Y_DENSITY_OFFSET..JFIF_Y_DENSITY_OFFSET + 2].copy_from_slice(&density);
    bytes
}

fn has_jfif_header(data: &[u8]) -> bool {
    data.len() >= JFIF_MIN_LEN
        && data[0..4] == [0xFF, 0xD8, 0xFF, 0xE0]
        && &data[JFIF_ID_OFFSET..JFIF_ID_OFFSET + 4] == JFIF_ID
}
