//! Error types for palette operations
//!
//! This module provides error types for color parsing and palette validation.

use std::fmt;

/// Error type for parsing hex color strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    /// The string is not of the form `#RRGGBB`
    InvalidFormat {
        /// The rejected input, verbatim
        input: String,
    },
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseColorError::InvalidFormat { input } => {
                write!(f, "invalid hex color {:?} (expected #RRGGBB)", input)
            }
        }
    }
}

impl std::error::Error for ParseColorError {}

/// Error type for palette validation.
///
/// Returned when a palette cannot be built: either no colors were given, or
/// one of the color strings failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    /// No colors provided in palette
    Empty,
    /// Invalid hex color string
    ParseColor(ParseColorError),
}

impl From<ParseColorError> for PaletteError {
    fn from(err: ParseColorError) -> Self {
        PaletteError::ParseColor(err)
    }
}

impl fmt::Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteError::Empty => {
                write!(f, "palette must contain at least one color")
            }
            PaletteError::ParseColor(err) => {
                write!(f, "{}", err)
            }
        }
    }
}

impl std::error::Error for PaletteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PaletteError::ParseColor(err) => Some(err),
            _ => None,
        }
    }
}
