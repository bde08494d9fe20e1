//! Raw interleaved pixel buffers
//!
//! A [`PixelBuffer`] owns row-major 8-bit pixel data with either three
//! (R, G, B) or four (R, G, B, A) channels per pixel.

use std::fmt;

/// Error type for pixel buffer construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Channel count other than 3 or 4
    UnsupportedChannels(u8),
    /// `data.len()` does not equal `width * height * channels`
    LengthMismatch {
        /// Length implied by the dimensions
        expected: usize,
        /// Length of the supplied data
        actual: usize,
    },
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::UnsupportedChannels(n) => {
                write!(f, "unsupported channel count {} (expected 3 or 4)", n)
            }
            BufferError::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "pixel data length mismatch: expected {} bytes, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for BufferError {}

/// Row-major 8-bit pixel data in R, G, B\[, A\] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw pixel data.
    ///
    /// # Errors
    ///
    /// - [`BufferError::UnsupportedChannels`] unless `channels` is 3 or 4
    /// - [`BufferError::LengthMismatch`] if `data` is not exactly
    ///   `width * height * channels` bytes
    ///
    /// # Example
    ///
    /// ```
    /// use palette_remap::PixelBuffer;
    ///
    /// let buffer = PixelBuffer::new(2, 1, 4, vec![0; 8]).unwrap();
    /// assert!(buffer.has_alpha());
    /// assert!(PixelBuffer::new(2, 1, 3, vec![0; 8]).is_err());
    /// ```
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, BufferError> {
        if channels != 3 && channels != 4 {
            return Err(BufferError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel: 3 or 4.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over rows as mutable `width * channels`-sized slices.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        // A zero-width buffer has no data, so any nonzero chunk size yields no rows
        let row_len = (self.width as usize * self.channels as usize).max(1);
        self.data.chunks_exact_mut(row_len)
    }
}
