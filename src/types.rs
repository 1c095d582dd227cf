//! Shared value types passed between the planner, the gate, the rasterizer and
//! the export pipeline.
//!
//! Everything here is a small `Copy`/`Clone` value. A [`TargetSpec`] is a
//! snapshot: once an export run starts it is never mutated, and the pipeline
//! owns its own copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pixel dimensions. Both axes are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Build a size, rejecting zero-length axes.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }

    /// Width divided by height.
    pub fn ratio(self) -> f64 {
        self.width as f64 / self.height as f64
    }

    pub fn is_landscape(self) -> bool {
        self.width >= self.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// Rectangle covering `size` from the origin.
    pub fn full(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            w: size.width,
            h: size.height,
        }
    }

    pub fn size(self) -> Size {
        Size {
            width: self.w,
            height: self.h,
        }
    }

    /// True when the rectangle lies entirely within `bounds`.
    pub fn fits_within(self, bounds: Size) -> bool {
        self.x as u64 + self.w as u64 <= bounds.width as u64
            && self.y as u64 + self.h as u64 <= bounds.height as u64
    }
}

/// How the source is laid out on the target canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    /// Center-crop to the target ratio, then scale to fill the canvas.
    #[default]
    Crop,
    /// Scale to fit inside the canvas; pad with the background color.
    Fit,
    /// Like `Fit`, inside a uniform border sized as a percentage of the short edge.
    Mat,
}

impl LayoutMode {
    /// Suffix appended to artifact filenames; crop exports carry none.
    pub fn filename_suffix(self) -> &'static str {
        match self {
            LayoutMode::Crop => "",
            LayoutMode::Fit => "_fit",
            LayoutMode::Mat => "_mat",
        }
    }

    /// Whether the canvas is pre-filled with the background color.
    pub fn fills_background(self) -> bool {
        !matches!(self, LayoutMode::Crop)
    }
}

impl FromStr for LayoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "crop" => Ok(LayoutMode::Crop),
            "fit" => Ok(LayoutMode::Fit),
            "mat" => Ok(LayoutMode::Mat),
            other => Err(format!("unknown mode '{other}' (expected crop, fit or mat)")),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LayoutMode::Crop => "crop",
            LayoutMode::Fit => "fit",
            LayoutMode::Mat => "mat",
        })
    }
}

/// Encoded output format.
///
/// Declaration order is the export order: PNG artifacts come before JPEG.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    /// Upper-case label used in progress messages.
    pub fn label(self) -> &'static str {
        match self {
            OutputFormat::Png => "PNG",
            OutputFormat::Jpeg => "JPEG",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            other => Err(format!("unknown format '{other}' (expected png or jpeg)")),
        }
    }
}

/// Opaque RGB color, written as `#rrggbb` in config files and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color {0:?}: expected #rrggbb")]
pub struct ParseColorError(pub String);

impl FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseColorError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ParseColorError(s.to_string()))
        };
        Ok(Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Inclusive range accepted for the mat border percentage.
pub const MAT_PERCENT_RANGE: std::ops::RangeInclusive<u32> = 1..=20;

/// One poster size the user asked for, with its layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Ratio group id, e.g. `"4x5"`.
    pub id: String,
    /// Human label, e.g. `"4:5 Portrait"`.
    pub label: String,
    /// Filename fragment, e.g. `"24x30_portrait"`.
    pub filename_tag: String,
    pub size: Size,
    pub mode: LayoutMode,
    /// Mat border as a percentage of the target's short edge (Mat only).
    pub mat_percent: u32,
    /// Canvas fill for Fit and Mat.
    pub background: Rgb,
}

/// A target the quality gate rejected because it would need upscaling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub target: TargetSpec,
    /// Pixel size the target demands.
    pub required_size: Size,
    /// Largest region the source can supply without enlargement.
    pub achievable_crop_size: Size,
}

/// One encoded file ready for packaging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}
