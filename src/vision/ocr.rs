//! OCR (Optical Character Recognition) seam
//!
//! The recognizer itself is an external collaborator. Anything that can turn
//! an image into `(quad, text, confidence)` triples implements
//! [`TextRecognizer`] and can drive the detector.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::frame::ScanImage;
use super::geometry::{Point, Quad};

/// Single OCR hit as reported by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Bounding quadrilateral, four corners in pixel coordinates
    pub region: Quad,
    /// Recognized text, unfiltered
    pub text: String,
    /// Recognition confidence (0.0 - 1.0)
    pub confidence: f64,
}

impl RawDetection {
    pub fn new(region: Quad, text: impl Into<String>, confidence: f64) -> Self {
        Self {
            region,
            text: text.into(),
            confidence,
        }
    }
}

/// Anything that can run text recognition on a decoded image
///
/// Implementations must be shareable across threads: one recognizer serves
/// concurrent scans. Failures are returned as-is and never retried by the caller.
pub trait TextRecognizer: Send + Sync {
    /// Recognize every text region in the image
    fn recognize(&self, image: &ScanImage, language: &str) -> Result<Vec<RawDetection>>;
}

/// Recognizer that replays a fixed list of detections
///
/// Useful for tests and for feeding detections that were produced elsewhere.
#[derive(Debug, Clone, Default)]
pub struct FixedRecognizer {
    detections: Vec<RawDetection>,
}

impl FixedRecognizer {
    pub fn new(detections: Vec<RawDetection>) -> Self {
        Self { detections }
    }
}

impl TextRecognizer for FixedRecognizer {
    fn recognize(&self, _image: &ScanImage, _language: &str) -> Result<Vec<RawDetection>> {
        Ok(self.detections.clone())
    }
}

/// Wire formats accepted from external OCR tools
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireDetection {
    /// `{"region": [[x, y], ...], "text": "...", "confidence": 0.9}`
    Object {
        region: [[f64; 2]; 4],
        text: String,
        confidence: f64,
    },
    /// EasyOCR `readtext` layout: `[[[x, y], ...], "text", 0.9]`
    Triple([[f64; 2]; 4], String, f64),
}

impl From<WireDetection> for RawDetection {
    fn from(wire: WireDetection) -> Self {
        let (region, text, confidence) = match wire {
            WireDetection::Object {
                region,
                text,
                confidence,
            } => (region, text, confidence),
            WireDetection::Triple(region, text, confidence) => (region, text, confidence),
        };

        RawDetection {
            region: region.map(Point::from),
            text,
            confidence,
        }
    }
}

/// Parse a JSON array of detections produced by an external OCR tool
pub fn parse_detections(json: &str) -> Result<Vec<RawDetection>> {
    let wire: Vec<WireDetection> =
        serde_json::from_str(json).context("failed to parse OCR JSON response")?;
    Ok(wire.into_iter().map(RawDetection::from).collect())
}
