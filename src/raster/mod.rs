//! Decoded raster buffers and the JPEG interchange format
//!
//! This module handles:
//! - The in-memory RGB8 pixel grid that every transform works on
//! - Immutable encoded buffers that sessions keep as history
//! - Decoding uploads and re-encoding transform results

pub mod codec;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use thiserror::Error;

pub use codec::{decode, Codec, DEFAULT_JPEG_QUALITY};

/// Bytes per pixel (R, G, B)
pub const CHANNELS: usize = 3;

/// Errors raised while moving between encoded bytes and pixels
#[derive(Error, Debug)]
pub enum RasterError {
    /// Upload was not a readable JPEG
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Encoder rejected a buffer. Indicates a broken invariant, not bad input.
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("pixel buffer of {len} bytes does not match {width}x{height} RGB")]
    BufferSize { width: u32, height: u32, len: usize },
}

/// Row-major RGB8 pixel grid
///
/// The buffer always holds exactly `width * height * 3` bytes, so every row
/// has `width` pixels and there are `height` rows.
#[derive(Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RasterImage {
    /// Wrap an existing buffer, checking its length against the dimensions
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        if data.len() != Self::buffer_len(width, height) {
            return Err(RasterError::BufferSize {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 3]) -> Self {
        let mut data = Vec::with_capacity(Self::buffer_len(width, height));
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes in one row
    pub fn stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw interleaved RGB bytes
    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    /// Pixel at (x, y). Panics when out of bounds, like slice indexing.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Same dimensions, new pixels. Callers produce `data` from `self`.
    pub(crate) fn with_pixels(&self, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), self.data.len());
        Self {
            width: self.width,
            height: self.height,
            data,
        }
    }

    fn buffer_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * CHANNELS
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Immutable JPEG bytes as stored in a session
///
/// Clones share the same allocation, so pushing the committed image onto a
/// history stack never copies pixel data.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedImage(Arc<[u8]>);

impl EncodedImage {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Deref for EncodedImage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedImage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for EncodedImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncodedImage({} bytes)", self.0.len())
    }
}
