//! Palette types and utilities
//!
//! This module provides the [`Palette`] type, nearest-color matching and the
//! error types for parsing and validation.

mod error;
mod palette;

pub use error::{PaletteError, ParseColorError};
pub use palette::{closest_color, remap_pixel, Palette, BLEND_DIVISOR};
