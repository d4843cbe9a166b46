//! Decoded input image for a scan

use image::{DynamicImage, ImageReader, ImageResult};
use std::path::{Path, PathBuf};

use crate::error::DetectError;

/// An image that has been successfully decoded and is ready for OCR
#[derive(Debug, Clone)]
pub struct ScanImage {
    /// Decoded pixels
    pub image: DynamicImage,
    /// File the image was read from, if any
    pub path: Option<PathBuf>,
}

impl ScanImage {
    /// Read and decode an image file
    ///
    /// The format is sniffed from the file contents; the extension is only a
    /// fallback when the contents are not recognized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let image = decode_file(path).map_err(|source| DetectError::ImageLoad {
            path: Some(path.to_path_buf()),
            source,
        })?;

        Ok(Self {
            image,
            path: Some(path.to_path_buf()),
        })
    }

    /// Decode an in-memory encoded image (format is guessed from the bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DetectError> {
        let image = image::load_from_memory(bytes)
            .map_err(|source| DetectError::ImageLoad { path: None, source })?;

        Ok(Self { image, path: None })
    }

    /// Wrap an already-decoded image
    pub fn from_image(image: DynamicImage) -> Self {
        Self { image, path: None }
    }

    /// Get image dimensions as (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

fn decode_file(path: &Path) -> ImageResult<DynamicImage> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}
