//! Palette struct with nearest-color matching.

use super::error::PaletteError;
use crate::color::Rgb;

/// Divisor applied to `original + matched` in blend mode.
///
/// This is not an average: `(a + b) / 5` deliberately darkens and mutes the
/// result. Channels stay in range because `(255 + 255) / 5 = 102`.
pub const BLEND_DIVISOR: u16 = 5;

/// An ordered, non-empty list of target colors.
///
/// Duplicates are allowed; the earliest entry wins any tie, so a later
/// duplicate is never selected. A `Palette` cannot be empty: the constructors
/// reject an empty list with [`PaletteError::Empty`].
///
/// # Example
///
/// ```
/// use palette_remap::{Palette, Rgb};
///
/// let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
/// assert_eq!(palette.len(), 2);
/// assert_eq!(palette.closest(Rgb::new(200, 200, 200)), Rgb::new(255, 255, 255));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Create a palette from a list of colors.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::Empty`] if `colors` is empty.
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        Ok(Self { colors })
    }

    /// Create a palette from `#RRGGBB` strings.
    ///
    /// Parsing stops at the first malformed entry.
    pub fn from_hex<S: AsRef<str>>(hex: &[S]) -> Result<Self, PaletteError> {
        let colors = hex
            .iter()
            .map(|s| s.as_ref().parse::<Rgb>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(colors)
    }

    /// Create a palette from a comma-separated list such as
    /// `"#FF0000,#00FF00"`.
    ///
    /// Every entry must be exactly `#RRGGBB`: blank entries and entries
    /// padded with spaces are malformed. Only a list that is empty (or all
    /// whitespace) yields [`PaletteError::Empty`].
    ///
    /// ```
    /// use palette_remap::{Palette, PaletteError};
    ///
    /// let palette = Palette::from_hex_list("#FF0000,#00ff00").unwrap();
    /// assert_eq!(palette.len(), 2);
    /// assert_eq!(Palette::from_hex_list(""), Err(PaletteError::Empty));
    /// assert!(Palette::from_hex_list("#FF0000, #00FF00").is_err());
    /// ```
    pub fn from_hex_list(list: &str) -> Result<Self, PaletteError> {
        if list.trim().is_empty() {
            return Err(PaletteError::Empty);
        }
        let entries: Vec<&str> = list.split(',').collect();
        Self::from_hex(&entries)
    }

    /// Number of entries, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; empty palettes are rejected at construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Find the palette entry nearest to `pixel`.
    ///
    /// Returns `(index, distance)` where distance is the Manhattan distance
    /// in RGB. Only a strictly smaller distance replaces the current best, so
    /// ties resolve to the lowest index.
    #[inline]
    pub fn nearest(&self, pixel: Rgb) -> (usize, u32) {
        // Linear scan; palettes are small
        let mut best_idx = 0;
        let mut best_dist = u32::MAX;

        for (i, &color) in self.colors.iter().enumerate() {
            let dist = pixel.distance(color);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
                if dist == 0 {
                    break;
                }
            }
        }

        (best_idx, best_dist)
    }

    /// The palette color nearest to `pixel`.
    #[inline]
    pub fn closest(&self, pixel: Rgb) -> Rgb {
        self.colors[self.nearest(pixel).0]
    }
}

/// Map `pixel` to its closest palette entry.
///
/// Free-function form of [`Palette::closest`].
#[inline]
pub fn closest_color(pixel: Rgb, palette: &Palette) -> Rgb {
    palette.closest(pixel)
}

/// Map `pixel` to its palette color, optionally blended with the original.
///
/// With `blend` set, each channel becomes
/// `(original + matched) / BLEND_DIVISOR` (floor division).
///
/// ```
/// use palette_remap::{remap_pixel, Palette, Rgb};
///
/// let palette = Palette::from_hex(&["#FF0000"]).unwrap();
/// let out = remap_pixel(Rgb::new(200, 100, 50), &palette, true);
/// assert_eq!(out, Rgb::new(91, 20, 10));
/// ```
#[inline]
pub fn remap_pixel(pixel: Rgb, palette: &Palette, blend: bool) -> Rgb {
    let matched = palette.closest(pixel);
    if !blend {
        return matched;
    }

    let mix = |orig: u8, pal: u8| ((orig as u16 + pal as u16) / BLEND_DIVISOR) as u8;
    Rgb::new(
        mix(pixel.r, matched.r),
        mix(pixel.g, matched.g),
        mix(pixel.b, matched.b),
    )
}


// ============================================================================
// Property-Based Tests
// ============================================================================
