//! Parameter types for encoding.
//!
//! These structs describe *what* to produce, not *how*. They sit between the
//! export pipeline (which decides what files to create) and the
//! [`backend`](super::backend) (which does the pixel work), so a mock backend
//! can be swapped in without touching pipeline logic.
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 92). Clamped on construction.
//! - [`EncodeSettings`]: quality plus the DPI stamped into every artifact.

use super::dpi::PRINT_DPI;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(92)
    }
}

/// Everything needed to turn a rendered canvas into artifact bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// JPEG quality; PNG output is lossless and ignores it.
    pub jpeg_quality: Quality,
    /// Physical resolution written into the encoded file.
    pub dpi: u16,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            jpeg_quality: Quality::default(),
            dpi: PRINT_DPI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_92() {
        assert_eq!(Quality::default().value(), 92);
    }

    #[test]
    fn default_settings_print_at_300_dpi() {
        assert_eq!(EncodeSettings::default().dpi, 300);
    }
}
