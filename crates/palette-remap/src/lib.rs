#![allow(clippy::module_inception)]

//! palette-remap: nearest-color palette remapping
//!
//! Maps every pixel of an 8-bit RGB or RGBA image onto the closest entry of
//! a user-supplied palette.
//!
//! # Quick Start
//!
//! ```
//! use palette_remap::{quantize, Palette, PixelBuffer};
//!
//! let palette = Palette::from_hex_list("#FF0000,#00FF00,#0000FF").unwrap();
//! let mut image = PixelBuffer::new(1, 1, 3, vec![200, 30, 40]).unwrap();
//! quantize(&mut image, &palette, false);
//! assert_eq!(image.as_bytes(), &[255, 0, 0]);
//! ```
//!
//! # Matching
//!
//! Distance is the plain sum of absolute channel differences on the stored
//! sRGB bytes:
//!
//! ```text
//! d = |r1 - r2| + |g1 - g2| + |b1 - b2|
//! ```
//!
//! There is no gamma decoding, perceptual weighting or error diffusion. Each
//! pixel is matched independently, so the output depends only on the pixel
//! and the palette. On a tie the entry that appears first in the palette
//! wins.
//!
//! # Blend mode
//!
//! With blending enabled the matched color is combined with the original as
//! `(original + matched) / 5` per channel, floored. The divisor is fixed at
//! [`BLEND_DIVISOR`]; the result is a dark, muted tint of the palette color
//! rather than a halfway mix.

pub mod buffer;
pub mod color;
pub mod palette;
pub mod quantize;

pub use buffer::{BufferError, PixelBuffer};
pub use color::Rgb;
pub use palette::{
    closest_color, remap_pixel, Palette, PaletteError, ParseColorError, BLEND_DIVISOR,
};
pub use quantize::{quantize, quantize_until};
