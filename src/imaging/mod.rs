//! Image processing: layout geometry, the quality gate, rendering and DPI metadata.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Plan** | [`geometry::plan`]: crop / fit / mat rectangles |
//! | **Gate** | [`quality::check`]: reject targets that need upscaling |
//! | **Render + encode** | [`RustBackend`]: `image` crate, Lanczos3 |
//! | **DPI** | [`dpi::embed_dpi`]: PNG `pHYs` insert, JPEG JFIF patch |
//!
//! The module is split into:
//! - **Geometry**: Pure functions for placement math (unit testable)
//! - **Quality**: The upscale gate, built on the same crop math
//! - **Parameters**: Encoding settings
//! - **Backend**: [`RasterBackend`] trait + [`RustBackend`]
//! - **DPI**: Byte-level metadata injection
//! - **Operations**: High-level functions combining the above

pub mod backend;
pub mod dpi;
pub mod geometry;
pub mod operations;
mod params;
pub mod quality;
pub mod rust_backend;

pub use backend::{BackendError, RasterBackend, SourceImage};
pub use geometry::{PlacementPlan, center_crop, plan};
pub use operations::{encode_artifact, plan_target, render_target};
pub use params::{EncodeSettings, Quality};
pub use quality::{GateResult, check};
pub use rust_backend::{RustBackend, open_source};
