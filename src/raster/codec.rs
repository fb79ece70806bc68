//! JPEG decode/encode between upload bytes and `RasterImage`

use image::codecs::jpeg::JpegEncoder;
use image::error::{ParameterError, ParameterErrorKind};
use image::{ExtendedColorType, ImageError, ImageFormat};

use super::{EncodedImage, RasterError, RasterImage};

/// Quality used when none is configured (matches the usual JPEG default)
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Decode JPEG bytes into an RGB8 raster
///
/// Grayscale and CMYK inputs are converted to RGB. Anything that is not a
/// readable JPEG is rejected with `RasterError::Decode`.
pub fn decode(bytes: &[u8]) -> Result<RasterImage, RasterError> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(RasterError::Decode)?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    RasterImage::from_raw(width, height, rgb.into_raw())
}

/// JPEG encoder settings shared by every render in an editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    quality: u8,
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl Codec {
    /// Quality is clamped into 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<RasterImage, RasterError> {
        decode(bytes)
    }

    /// Encode a raster as baseline JPEG
    ///
    /// The same pixels at the same quality always produce the same bytes.
    pub fn encode(&self, img: &RasterImage) -> Result<EncodedImage, RasterError> {
        if img.is_empty() {
            return Err(RasterError::Encode(ImageError::Parameter(
                ParameterError::from_kind(ParameterErrorKind::DimensionMismatch),
            )));
        }

        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, self.quality);
        encoder
            .encode(img.as_raw(), img.width(), img.height(), ExtendedColorType::Rgb8)
            .map_err(RasterError::Encode)?;

        Ok(EncodedImage::from(buf))
    }
}
