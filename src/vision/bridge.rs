//! External OCR backends
//!
//! Neither backend does recognition itself. [`BridgeRecognizer`] shells out to
//! an OCR program (typically a small EasyOCR script) and [`SidecarRecognizer`]
//! replays output that such a program saved next to the image.

use anyhow::{bail, Context, Result};
use image::ImageFormat;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use super::frame::ScanImage;
use super::ocr::{parse_detections, RawDetection, TextRecognizer};

/// Runs an external OCR program and parses its JSON output
///
/// The program is invoked as `<program> [args...] --image <path> --lang <tag>`
/// and must print a JSON array of detections on stdout.
#[derive(Debug, Clone)]
pub struct BridgeRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl BridgeRecognizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra leading arguments, e.g. the script path when `program` is `python3`
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    fn run(&self, image_path: &Path, language: &str) -> Result<Vec<RawDetection>> {
        debug!(
            "OCR bridge: {:?} {:?} on {:?} ({})",
            self.program, self.args, image_path, language
        );

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("--image")
            .arg(image_path)
            .arg("--lang")
            .arg(language)
            .output()
            .with_context(|| format!("failed to invoke OCR bridge {:?}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("OCR bridge failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let detections = parse_detections(&stdout)?;
        debug!("OCR bridge: {} detections", detections.len());
        Ok(detections)
    }
}

impl TextRecognizer for BridgeRecognizer {
    fn recognize(&self, image: &ScanImage, language: &str) -> Result<Vec<RawDetection>> {
        if let Some(path) = &image.path {
            return self.run(path, language);
        }

        // In-memory image: hand the program a temporary PNG
        let temp = tempfile::Builder::new()
            .prefix("card-scan-")
            .suffix(".png")
            .tempfile()
            .context("failed to create temporary image file")?;
        image
            .image
            .save_with_format(temp.path(), ImageFormat::Png)
            .context("failed to write temporary image file")?;

        self.run(temp.path(), language)
    }
}

/// Reads pre-computed OCR output stored next to the image
///
/// For `card.png` and the default suffix the detections are read from
/// `card.png.ocr.json`. The language tag is ignored.
#[derive(Debug, Clone)]
pub struct SidecarRecognizer {
    suffix: String,
}

impl SidecarRecognizer {
    pub const DEFAULT_SUFFIX: &'static str = ".ocr.json";

    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    /// Location of the sidecar file for an image
    pub fn sidecar_path(&self, image_path: &Path) -> PathBuf {
        let mut name = image_path.as_os_str().to_owned();
        name.push(&self.suffix);
        PathBuf::from(name)
    }
}

impl Default for SidecarRecognizer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUFFIX)
    }
}

impl TextRecognizer for SidecarRecognizer {
    fn recognize(&self, image: &ScanImage, _language: &str) -> Result<Vec<RawDetection>> {
        let Some(path) = &image.path else {
            bail!("sidecar OCR needs an image loaded from a file");
        };

        let sidecar = self.sidecar_path(path);
        let content = fs::read_to_string(&sidecar)
            .with_context(|| format!("failed to read OCR sidecar {:?}", sidecar))?;
        parse_detections(&content)
    }
}
