//! Packaging exported artifacts into one ZIP.
//!
//! The export pipeline only depends on the [`Archiver`] trait: hand it the
//! finished artifacts in order and a progress callback, get one blob back.
//! [`ZipArchiver`] is the real implementation (DEFLATE, level 6 by default;
//! level 0 stores entries uncompressed).

use crate::types::OutputArtifact;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Default DEFLATE level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create ZIP file: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to create ZIP file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Nothing to archive")]
    Empty,
}

/// A packaged archive ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Packages artifacts into a single blob.
pub trait Archiver {
    /// Package `artifacts` in the given order.
    ///
    /// `progress` is called with the completed fraction in `0.0..=1.0`.
    fn package(
        &self,
        artifacts: &[OutputArtifact],
        progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<u8>, ArchiveError>;
}

/// DEFLATE-compressed ZIP in memory.
#[derive(Debug, Clone, Copy)]
pub struct ZipArchiver {
    level: u32,
}

impl ZipArchiver {
    /// Levels above 9 are clamped.
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

impl Archiver for ZipArchiver {
    fn package(
        &self,
        artifacts: &[OutputArtifact],
        progress: &mut dyn FnMut(f64),
    ) -> Result<Vec<u8>, ArchiveError> {
        if artifacts.is_empty() {
            return Err(ArchiveError::Empty);
        }

        // DEFLATE only takes levels 1-9; 0 means no compression at all
        let options = if self.level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(self.level as i64))
        };
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));

        let total = artifacts.len() as f64;
        progress(0.0);
        for (i, artifact) in artifacts.iter().enumerate() {
            zip.start_file(artifact.filename.as_str(), options)?;
            zip.write_all(&artifact.bytes)?;
            progress((i + 1) as f64 / total);
        }

        let cursor = zip.finish()?;
        let bytes = cursor.into_inner();
        log::debug!(
            "packaged {} files into {} bytes (level {})",
            artifacts.len(),
            bytes.len(),
            self.level
        );
        Ok(bytes)
    }
}
