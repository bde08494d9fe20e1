//! Whole-buffer palette remapping.

use crate::buffer::PixelBuffer;
use crate::color::Rgb;
use crate::palette::{remap_pixel, Palette};

/// Remap every pixel of `buffer` onto `palette` in place.
///
/// Only the R, G and B bytes of each pixel are written; the alpha byte of
/// a four-channel buffer is left as it was.
///
/// # Example
///
/// ```
/// use palette_remap::{quantize, Palette, PixelBuffer};
///
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
/// let mut buffer = PixelBuffer::new(2, 1, 4, vec![10, 10, 10, 7, 250, 240, 230, 9]).unwrap();
/// quantize(&mut buffer, &palette, false);
/// assert_eq!(buffer.as_bytes(), &[0, 0, 0, 7, 255, 255, 255, 9]);
/// ```
pub fn quantize(buffer: &mut PixelBuffer, palette: &Palette, blend: bool) {
    quantize_until(buffer, palette, blend, || false);
}

/// Like [`quantize`], but asks `stop` before each row.
///
/// Returns `false` if `stop` returned `true`; rows already processed stay
/// remapped and the rest are untouched. Returns `true` once every row is done.
pub fn quantize_until<F>(
    buffer: &mut PixelBuffer,
    palette: &Palette,
    blend: bool,
    mut stop: F,
) -> bool
where
    F: FnMut() -> bool,
{
    let channels = buffer.channels() as usize;

    for row in buffer.rows_mut() {
        if stop() {
            return false;
        }
        for px in row.chunks_exact_mut(channels) {
            let mapped = remap_pixel(Rgb::new(px[0], px[1], px[2]), palette, blend);
            px[..3].copy_from_slice(&mapped.to_bytes());
        }
    }
    true
}
