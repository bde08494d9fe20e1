//! Color types

mod rgb;

pub use rgb::Rgb;
