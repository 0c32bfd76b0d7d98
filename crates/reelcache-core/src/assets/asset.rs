use std::io::Cursor;

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("Malformed image payload: {0}")]
    Malformed(String),
}

/// Raw bytes of a cached image plus what is needed to display it.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    url: String,
    bytes: Bytes,
    format: ImageFormat,
    width: u32,
    height: u32,
}

impl Asset {
    /// Validate `bytes` as an image by reading its header.
    pub fn from_bytes(url: impl Into<String>, bytes: Bytes) -> Result<Self, AssetError> {
        let reader = ImageReader::new(Cursor::new(bytes.as_ref()))
            .with_guessed_format()
            .map_err(|e| AssetError::Malformed(e.to_string()))?;
        let format = reader
            .format()
            .ok_or_else(|| AssetError::Malformed("unrecognised image format".to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| AssetError::Malformed(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            bytes,
            format,
            width,
            height,
        })
    }

    /// Decode the full image for display.
    pub fn decode(&self) -> Result<DynamicImage, AssetError> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| AssetError::Malformed(e.to_string()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Size of the encoded payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_bytes;

    #[test]
    fn test_from_bytes_reads_format_and_dimensions() {
        let asset = Asset::from_bytes("https://img.test/a.png", png_bytes(3, 2)).unwrap();
        assert_eq!(asset.format(), ImageFormat::Png);
        assert_eq!(asset.dimensions(), (3, 2));
        assert_eq!(asset.decode().unwrap().width(), 3);
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        let result = Asset::from_bytes("https://img.test/a.png", Bytes::from_static(b"<html>nope</html>"));
        assert!(matches!(result, Err(AssetError::Malformed(_))));
    }

    #[test]
    fn test_from_bytes_rejects_truncated_image() {
        let full = png_bytes(4, 4);
        let truncated = full.slice(..10);
        assert!(Asset::from_bytes("u", truncated).is_err());
    }
}
