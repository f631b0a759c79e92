use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};

use crate::error::PipelineError;

/// Decoded photo, immutable once loaded
#[derive(Debug, Clone)]
pub struct Image {
    pixels: DynamicImage,
    source: PathBuf,
}

impl Image {
    pub fn new(pixels: DynamicImage, source: impl Into<PathBuf>) -> Self {
        Self {
            pixels,
            source: source.into(),
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Reads image files from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageLoader;

impl ImageLoader {
    pub fn new() -> Self {
        Self
    }

    /// Decode the file at `path`; the format is sniffed from its content.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Image, PipelineError> {
        let path = path.as_ref();
        let decode_error = |reason: String| PipelineError::Decode {
            path: path.to_path_buf(),
            reason,
        };

        let pixels = ImageReader::open(path)
            .map_err(|e| decode_error(e.to_string()))?
            .with_guessed_format()
            .map_err(|e| decode_error(e.to_string()))?
            .decode()
            .map_err(|e| decode_error(e.to_string()))?;

        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(decode_error("image has no pixels".to_string()));
        }

        tracing::debug!(path = ?path, width = pixels.width(), height = pixels.height(), "image loaded");
        Ok(Image::new(pixels, path))
    }
}
