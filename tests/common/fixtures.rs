//! Test fixtures: images generated on the fly and palettes.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Palettes used across tests
pub mod palettes {
    pub const RGB: &str = "#FF0000,#00FF00,#0000FF";
    pub const RED: &str = "#FF0000";
    pub const MONO: &str = "#000000,#FFFFFF";
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, format)
        .expect("Failed to encode fixture image");
    buf.into_inner()
}

/// Solid-color RGB PNG
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        RgbImage::from_pixel(width, height, Rgb(color)).into(),
        ImageFormat::Png,
    )
}

/// Solid-color JPEG
pub fn solid_jpeg(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    encode(
        RgbImage::from_pixel(width, height, Rgb(color)).into(),
        ImageFormat::Jpeg,
    )
}

/// RGBA PNG from a row of pixels
pub fn rgba_row_png(pixels: &[[u8; 4]]) -> Vec<u8> {
    let mut image = RgbaImage::new(pixels.len() as u32, 1);
    for (x, pixel) in pixels.iter().enumerate() {
        image.put_pixel(x as u32, 0, Rgba(*pixel));
    }
    encode(image.into(), ImageFormat::Png)
}

/// Bytes that claim to be a PNG but are not
pub fn corrupt_png() -> Vec<u8> {
    b"this is not really an image".to_vec()
}

/// Decode PNG bytes to RGBA pixels
pub fn decode_rgba(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes)
        .expect("Failed to decode PNG")
        .into_rgba8()
}
