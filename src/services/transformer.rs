//! Image transformer: decode, remap onto a palette, encode as PNG.
//!
//! All functions here are blocking and CPU-bound. The worker calls
//! [`ImageTransformer::transform`] from `spawn_blocking`.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use image::ImageReader;
use palette_remap::{quantize_until, Palette, PixelBuffer};

use crate::error::TransformError;
use crate::models::{Job, JobId};

/// Converts job sources into `<output_dir>/<job id>.png`
pub struct ImageTransformer {
    output_dir: PathBuf,
    optimize: bool,
}

impl ImageTransformer {
    pub fn new(output_dir: impl Into<PathBuf>, optimize: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            optimize,
        }
    }

    /// Deterministic output location for a job
    pub fn output_path(&self, job_id: &JobId) -> PathBuf {
        self.output_dir.join(job_id.output_file_name())
    }

    /// Convert a job's source image and write the result.
    ///
    /// The source file is removed only after the output has been written.
    /// On any error the source stays where it is. `cancelled` is checked
    /// after decoding, between rows and once more right before the write;
    /// once it is seen the call returns [`TransformError::Cancelled`] having
    /// written nothing. Past that last check the write is committed.
    pub fn transform(&self, job: &Job, cancelled: &AtomicBool) -> Result<PathBuf, TransformError> {
        let png_bytes = convert_file(
            &job.source_path,
            &job.palette,
            job.blend,
            self.optimize,
            cancelled,
        )?;

        if cancelled.load(Ordering::Acquire) {
            return Err(TransformError::Cancelled);
        }

        fs::create_dir_all(&self.output_dir)?;
        let output_path = self.output_path(&job.id);
        fs::write(&output_path, &png_bytes)?;

        if let Err(e) = fs::remove_file(&job.source_path) {
            tracing::warn!(
                job_id = %job.id,
                path = %job.source_path.display(),
                error = %e,
                "Failed to delete consumed upload"
            );
        }

        Ok(output_path)
    }
}

/// Decode, remap and encode a file, returning PNG bytes. Touches no files
/// other than reading `source`. Stops with [`TransformError::Cancelled`] as
/// soon as `cancelled` is seen between rows.
pub fn convert_file(
    source: &Path,
    palette: &Palette,
    blend: bool,
    optimize: bool,
    cancelled: &AtomicBool,
) -> Result<Vec<u8>, TransformError> {
    let mut buffer = decode(source)?;
    if !quantize_until(&mut buffer, palette, blend, || cancelled.load(Ordering::Acquire)) {
        return Err(TransformError::Cancelled);
    }
    encode_png(&buffer, optimize)
}

/// Decode a JPEG or PNG file into an 8-bit buffer.
///
/// Images with an alpha channel decode to RGBA, everything else to RGB.
pub fn decode(source: &Path) -> Result<PixelBuffer, TransformError> {
    let reader = ImageReader::open(source)?.with_guessed_format()?;
    let image = reader
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;

    let buffer = if image.color().has_alpha() {
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        PixelBuffer::new(width, height, 4, rgba.into_raw())?
    } else {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        PixelBuffer::new(width, height, 3, rgb.into_raw())?
    };

    Ok(buffer)
}

/// Encode a buffer as 8-bit RGB or RGBA PNG.
pub fn encode_png(buffer: &PixelBuffer, optimize: bool) -> Result<Vec<u8>, TransformError> {
    let color_type = if buffer.has_alpha() {
        png::ColorType::Rgba
    } else {
        png::ColorType::Rgb
    };

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = png::Encoder::new(&mut buf, buffer.width(), buffer.height());
        encoder.set_color(color_type);
        encoder.set_depth(png::BitDepth::Eight);
        encoder.set_compression(png::Compression::Default);
        let mut writer = encoder
            .write_header()
            .map_err(|e| TransformError::Encode(e.to_string()))?;
        writer
            .write_image_data(buffer.as_bytes())
            .map_err(|e| TransformError::Encode(e.to_string()))?;
    }
    let png_bytes = buf.into_inner();

    if !optimize {
        return Ok(png_bytes);
    }

    // Re-compress with oxipng; keep the plain encoding if that fails
    match oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            ..Default::default()
        },
    ) {
        Ok(optimized) => Ok(optimized),
        Err(e) => {
            tracing::warn!(error = %e, "PNG optimization failed, keeping unoptimized output");
            Ok(png_bytes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    fn write_image(dir: &Path, name: &str, image: image::DynamicImage, format: ImageFormat) -> PathBuf {
        let path = dir.join(name);
        image.save_with_format(&path, format).unwrap();
        path
    }

    fn rgb_palette() -> Palette {
        Palette::from_hex(&["#FF0000", "#00FF00", "#0000FF"]).unwrap()
    }

    #[test]
    fn test_solid_red_png_maps_to_red() {
        let dir = TempDir::new().unwrap();
        let source = write_image(
            dir.path(),
            "red.png",
            RgbImage::from_pixel(8, 4, Rgb([255, 0, 0])).into(),
            ImageFormat::Png,
        );

        let png_bytes = convert_file(&source, &rgb_palette(), false, false, &AtomicBool::new(false)).unwrap();
        let decoded = image::load_from_memory(&png_bytes).unwrap().into_rgb8();

        assert_eq!(decoded.dimensions(), (8, 4));
        assert!(decoded.pixels().all(|p| p.0 == [255, 0, 0]));
    }

    #[test]
    fn test_jpeg_source_is_supported() {
        let dir = TempDir::new().unwrap();
        let source = write_image(
            dir.path(),
            "photo.jpg",
            RgbImage::from_pixel(16, 16, Rgb([20, 30, 240])).into(),
            ImageFormat::Jpeg,
        );

        let png_bytes = convert_file(&source, &rgb_palette(), false, false, &AtomicBool::new(false)).unwrap();
        let decoded = image::load_from_memory(&png_bytes).unwrap().into_rgb8();

        // JPEG noise is small compared to the distance between palette entries
        assert!(decoded.pixels().all(|p| p.0 == [0, 0, 255]));
    }

    #[test]
    fn test_alpha_channel_preserved() {
        let dir = TempDir::new().unwrap();
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, Rgba([250, 250, 250, 0]));
        rgba.put_pixel(1, 0, Rgba([5, 5, 5, 77]));
        let source = write_image(dir.path(), "alpha.png", rgba.into(), ImageFormat::Png);

        let palette = Palette::from_hex(&["#000000", "#FFFFFF"]).unwrap();
        let buffer = decode(&source).unwrap();
        assert!(buffer.has_alpha());

        let png_bytes = convert_file(&source, &palette, false, false, &AtomicBool::new(false)).unwrap();
        let decoded = image::load_from_memory(&png_bytes).unwrap().into_rgba8();
        assert_eq!(decoded.get_pixel(0, 0).0, [255, 255, 255, 0]);
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 0, 0, 77]);
    }

    #[test]
    fn test_optimized_output_decodes_identically() {
        let dir = TempDir::new().unwrap();
        let source = write_image(
            dir.path(),
            "green.png",
            RgbImage::from_pixel(32, 32, Rgb([10, 200, 10])).into(),
            ImageFormat::Png,
        );

        let plain = convert_file(&source, &rgb_palette(), true, false, &AtomicBool::new(false)).unwrap();
        let optimized = convert_file(&source, &rgb_palette(), true, true, &AtomicBool::new(false)).unwrap();

        let a = image::load_from_memory(&plain).unwrap().into_rgb8();
        let b = image::load_from_memory(&optimized).unwrap().into_rgb8();
        assert_eq!(a.as_raw(), b.as_raw());
        // (10+0)/5, (200+255)/5, (10+0)/5
        assert_eq!(a.get_pixel(0, 0).0, [2, 91, 2]);
    }

    #[test]
    fn test_transform_writes_output_and_deletes_source() {
        let uploads = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let source = write_image(
            uploads.path(),
            "in.png",
            RgbImage::from_pixel(4, 4, Rgb([255, 0, 0])).into(),
            ImageFormat::Png,
        );
        let job = Job::new(JobId::generate(), &source, rgb_palette(), false);
        let transformer = ImageTransformer::new(outputs.path(), false);

        let output = transformer.transform(&job, &AtomicBool::new(false)).unwrap();

        assert_eq!(output, outputs.path().join(format!("{}.png", job.id)));
        assert!(output.exists());
        assert!(!source.exists(), "source should be deleted after success");
    }

    #[test]
    fn test_transform_overwrites_existing_output() {
        let uploads = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let source = write_image(
            uploads.path(),
            "in.png",
            RgbImage::from_pixel(2, 2, Rgb([0, 0, 250])).into(),
            ImageFormat::Png,
        );
        let job = Job::new(JobId::generate(), &source, rgb_palette(), false);
        let transformer = ImageTransformer::new(outputs.path(), false);
        fs::write(transformer.output_path(&job.id), b"stale").unwrap();

        let output = transformer.transform(&job, &AtomicBool::new(false)).unwrap();
        let decoded = image::open(&output).unwrap().into_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn test_corrupt_source_is_decode_error_and_kept() {
        let uploads = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let source = uploads.path().join("corrupt.png");
        fs::write(&source, b"definitely not an image").unwrap();
        let job = Job::new(JobId::generate(), &source, rgb_palette(), false);
        let transformer = ImageTransformer::new(outputs.path(), false);

        let err = transformer
            .transform(&job, &AtomicBool::new(false))
            .unwrap_err();

        assert!(matches!(err, TransformError::Decode(_)), "got {err:?}");
        assert!(source.exists(), "source must survive a failed transform");
        assert!(!transformer.output_path(&job.id).exists());
    }

    #[test]
    fn test_missing_source_is_io_error() {
        let outputs = TempDir::new().unwrap();
        let job = Job::new(
            JobId::generate(),
            outputs.path().join("nope.png"),
            rgb_palette(),
            false,
        );
        let transformer = ImageTransformer::new(outputs.path(), false);

        let err = transformer
            .transform(&job, &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, TransformError::Io(_)), "got {err:?}");
    }

    #[test]
    fn test_cancelled_transform_writes_nothing() {
        let uploads = TempDir::new().unwrap();
        let outputs = TempDir::new().unwrap();
        let source = write_image(
            uploads.path(),
            "in.png",
            RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])).into(),
            ImageFormat::Png,
        );
        let job = Job::new(JobId::generate(), &source, rgb_palette(), false);
        let transformer = ImageTransformer::new(outputs.path(), false);

        let err = transformer
            .transform(&job, &AtomicBool::new(true))
            .unwrap_err();

        assert!(matches!(err, TransformError::Cancelled), "got {err:?}");
        assert!(source.exists());
        assert!(!transformer.output_path(&job.id).exists());
    }

    #[test]
    fn test_convert_file_stops_when_cancelled() {
        let dir = TempDir::new().unwrap();
        let source = write_image(
            dir.path(),
            "big.png",
            RgbImage::from_pixel(64, 64, Rgb([7, 7, 7])).into(),
            ImageFormat::Png,
        );

        let err = convert_file(&source, &rgb_palette(), false, false, &AtomicBool::new(true))
            .unwrap_err();
        assert!(matches!(err, TransformError::Cancelled), "got {err:?}");
    }

    #[test]
    fn test_encode_png_rejects_empty_image() {
        let buffer = PixelBuffer::new(0, 0, 3, Vec::new()).unwrap();
        assert!(matches!(
            encode_png(&buffer, false),
            Err(TransformError::Encode(_))
        ));
    }
}
