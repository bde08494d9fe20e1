//! 8-bit RGB color type
//!
//! Palette entries and pixels are both plain 8-bit sRGB triples. No color
//! space conversion happens anywhere in this crate: distances are measured
//! directly on the stored bytes.

use std::fmt;
use std::str::FromStr;

use crate::palette::ParseColorError;

/// A color as three 8-bit channels in R, G, B order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a color from its three channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create a color from a byte array [R, G, B].
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }

    /// Convert to a byte array [R, G, B].
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Sum of absolute per-channel differences (Manhattan distance).
    ///
    /// The result is in `0..=765`.
    ///
    /// ```
    /// use palette_remap::Rgb;
    ///
    /// let a = Rgb::new(10, 20, 30);
    /// let b = Rgb::new(20, 10, 30);
    /// assert_eq!(a.distance(b), 20);
    /// ```
    #[inline]
    pub fn distance(self, other: Rgb) -> u32 {
        self.r.abs_diff(other.r) as u32
            + self.g.abs_diff(other.g) as u32
            + self.b.abs_diff(other.b) as u32
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(bytes: [u8; 3]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(color: Rgb) -> Self {
        color.to_bytes()
    }
}

impl fmt::Display for Rgb {
    /// Formats as `#RRGGBB` with uppercase hex digits.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = ParseColorError;

    /// Parse a color from `#RRGGBB`.
    ///
    /// The leading `#` is required and exactly six hex digits must follow.
    /// Digits are case-insensitive. Shorthand (`#RGB`), missing hash and
    /// surrounding whitespace are all rejected.
    ///
    /// ```
    /// use palette_remap::Rgb;
    ///
    /// let red: Rgb = "#ff0000".parse().unwrap();
    /// assert_eq!(red, Rgb::new(255, 0, 0));
    /// assert!("ff0000".parse::<Rgb>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseColorError::InvalidFormat {
            input: s.to_string(),
        };

        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}
