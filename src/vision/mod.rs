//! Vision/OCR Layer
//!
//! Turns a decoded image into sized, cleaned text detections.
//! Recognition is delegated to a [`TextRecognizer`]:
//! - external OCR program via [`BridgeRecognizer`]
//! - pre-computed JSON next to the image via [`SidecarRecognizer`]
//! - fixed detection list via [`FixedRecognizer`]

pub mod bridge;
pub mod frame;
pub mod geometry;
pub mod ocr;

use serde::{Deserialize, Serialize};

pub use bridge::{BridgeRecognizer, SidecarRecognizer};
pub use frame::ScanImage;
pub use geometry::{measure, rect_quad, BoxMetrics, Point, Quad};
pub use ocr::{parse_detections, FixedRecognizer, RawDetection, TextRecognizer};

use crate::matching::clean_text;

/// Language tags the command line offers
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr", "es", "de", "it"];

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Read `<image><suffix>` JSON written by an earlier OCR run
    #[default]
    Sidecar,
    /// Run an external OCR program per image
    Bridge,
}

/// An OCR detection with its cleaned text and size
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding quadrilateral
    pub region: Quad,
    /// Text as recognized
    pub raw_text: String,
    /// Alphabetic characters of `raw_text`, never empty
    pub cleaned_text: String,
    /// OCR confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Bounding box area
    pub area: f64,
    /// Bounding box width
    pub width: f64,
    /// Bounding box height
    pub height: f64,
}

impl Detection {
    /// Clean and measure a raw detection
    ///
    /// Returns `None` when the text has no alphabetic characters; such
    /// detections take no further part in a scan.
    pub fn from_raw(raw: RawDetection) -> Option<Self> {
        let cleaned_text = clean_text(&raw.text);
        if cleaned_text.is_empty() {
            return None;
        }

        let BoxMetrics {
            area,
            width,
            height,
        } = measure(&raw.region);

        Some(Self {
            region: raw.region,
            raw_text: raw.text,
            cleaned_text,
            confidence: raw.confidence,
            area,
            width,
            height,
        })
    }
}

/// Clean and measure every raw detection, keeping OCR order
pub fn prepare_detections(raw: Vec<RawDetection>) -> Vec<Detection> {
    raw.into_iter().filter_map(Detection::from_raw).collect()
}
