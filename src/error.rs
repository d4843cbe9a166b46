//! Error types for the scanning pipeline
//!
//! Only genuine faults live here. "Nothing found" is a normal outcome and is
//! reported through [`crate::detector::DetectionOutcome`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate a scan
#[derive(Debug, Error)]
pub enum DetectError {
    /// The image could not be read or decoded
    #[error("failed to load image{}: {source}", display_path(.path))]
    ImageLoad {
        /// Source file, when the image came from disk
        path: Option<PathBuf>,
        /// Underlying decode or I/O failure
        #[source]
        source: image::ImageError,
    },

    /// The vocabulary could not be loaded or is unusable
    #[error("vocabulary error: {0}")]
    Vocabulary(String),

    /// Detection parameters are out of range
    #[error("invalid detection config: {0}")]
    InvalidConfig(String),

    /// The OCR collaborator failed; passed through untouched
    #[error(transparent)]
    Recognition(#[from] anyhow::Error),
}

impl DetectError {
    /// True when the failure happened at the image-decode boundary
    pub fn is_image_load(&self) -> bool {
        matches!(self, DetectError::ImageLoad { .. })
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {}", p.display()),
        None => String::new(),
    }
}
