//! Pixel sinks: turn linear colors into encoded image bytes.
//!
//! A sink receives exactly `width * height` colors in row-major order,
//! top-to-bottom and left-to-right, after one call to `begin`.

use image::{ImageFormat, Rgb, RgbImage};
use lumen_math::{Color, Interval};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while encoding or writing pixels.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel written before begin()")]
    NotStarted,

    #[error("expected {expected} pixels, got {got}")]
    SizeMismatch { expected: u64, got: u64 },
}

/// Consumer of rendered pixels.
pub trait PixelSink {
    /// Announce the image size. Called once before any pixel.
    fn begin(&mut self, width: u32, height: u32) -> Result<(), OutputError>;

    /// Accept the next pixel in emission order.
    fn write_pixel(&mut self, color: Color) -> Result<(), OutputError>;

    /// Flush whatever framing the format needs.
    fn finish(&mut self) -> Result<(), OutputError>;
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

const INTENSITY: Interval = Interval::new(0.0, 0.999);

/// Convert a linear color to gamma-corrected 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let byte = |c: f32| (256.0 * INTENSITY.clamp(linear_to_gamma(c))) as u8;
    [byte(color.x), byte(color.y), byte(color.z)]
}

/// Tracks how many pixels a sink was promised and has received.
#[derive(Debug, Default)]
struct PixelCount {
    expected: Option<u64>,
    written: u64,
}

impl PixelCount {
    fn begin(&mut self, width: u32, height: u32) {
        self.expected = Some(u64::from(width) * u64::from(height));
        self.written = 0;
    }

    /// Reserve the next pixel slot, returning its index.
    fn next(&mut self) -> Result<u64, OutputError> {
        let expected = self.expected.ok_or(OutputError::NotStarted)?;
        if self.written >= expected {
            return Err(OutputError::SizeMismatch {
                expected,
                got: self.written + 1,
            });
        }
        self.written += 1;
        Ok(self.written - 1)
    }

    fn check_complete(&self) -> Result<(), OutputError> {
        let expected = self.expected.ok_or(OutputError::NotStarted)?;
        if self.written != expected {
            return Err(OutputError::SizeMismatch {
                expected,
                got: self.written,
            });
        }
        Ok(())
    }
}

/// Plain-text PPM (`P3`) writer.
pub struct PpmSink<W: Write> {
    out: W,
    count: PixelCount,
}

impl<W: Write> PpmSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            count: PixelCount::default(),
        }
    }

    /// Recover the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PixelSink for PpmSink<W> {
    fn begin(&mut self, width: u32, height: u32) -> Result<(), OutputError> {
        self.count.begin(width, height);
        write!(self.out, "P3\n{} {}\n255\n", width, height)?;
        Ok(())
    }

    fn write_pixel(&mut self, color: Color) -> Result<(), OutputError> {
        self.count.next()?;
        let [r, g, b] = color_to_rgb8(color);
        writeln!(self.out, "{} {} {}", r, g, b)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.count.check_complete()?;
        self.out.flush()?;
        Ok(())
    }
}

/// PNG file writer. The image is buffered and encoded on `finish`.
pub struct PngSink {
    path: PathBuf,
    image: RgbImage,
    count: PixelCount,
}

impl PngSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: RgbImage::new(0, 0),
            count: PixelCount::default(),
        }
    }
}

impl PixelSink for PngSink {
    fn begin(&mut self, width: u32, height: u32) -> Result<(), OutputError> {
        self.count.begin(width, height);
        self.image = RgbImage::new(width, height);
        Ok(())
    }

    fn write_pixel(&mut self, color: Color) -> Result<(), OutputError> {
        let index = self.count.next()?;
        let width = u64::from(self.image.width());
        let (x, y) = ((index % width) as u32, (index / width) as u32);
        self.image.put_pixel(x, y, Rgb(color_to_rgb8(color)));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.count.check_complete()?;
        self.image.save_with_format(&self.path, ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgb8_clamps() {
        assert_eq!(color_to_rgb8(Color::ZERO), [0, 0, 0]);
        assert_eq!(color_to_rgb8(Color::ONE), [255, 255, 255]);
        assert_eq!(color_to_rgb8(Color::new(4.0, -1.0, 0.25)), [255, 0, 128]);
    }

    #[test]
    fn test_ppm_framing() {
        let mut sink = PpmSink::new(Vec::new());
        sink.begin(2, 1).unwrap();
        sink.write_pixel(Color::ONE).unwrap();
        sink.write_pixel(Color::ZERO).unwrap();
        sink.finish().unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(text, "P3\n2 1\n255\n255 255 255\n0 0 0\n");
    }

    #[test]
    fn test_ppm_rejects_extra_pixels() {
        let mut sink = PpmSink::new(Vec::new());
        sink.begin(1, 1).unwrap();
        sink.write_pixel(Color::ONE).unwrap();
        assert!(matches!(
            sink.write_pixel(Color::ONE),
            Err(OutputError::SizeMismatch { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn test_ppm_rejects_short_image() {
        let mut sink = PpmSink::new(Vec::new());
        sink.begin(2, 2).unwrap();
        sink.write_pixel(Color::ONE).unwrap();
        assert!(matches!(
            sink.finish(),
            Err(OutputError::SizeMismatch { expected: 4, got: 1 })
        ));
    }

    #[test]
    fn test_pixel_before_begin() {
        let mut sink = PpmSink::new(Vec::new());
        assert!(matches!(sink.write_pixel(Color::ONE), Err(OutputError::NotStarted)));
    }

    #[test]
    fn test_png_sink_writes_file() {
        let path = std::env::temp_dir().join(format!("lumen_png_sink_{}.png", std::process::id()));
        let mut sink = PngSink::new(&path);
        sink.begin(2, 2).unwrap();
        for color in [Color::ONE, Color::ZERO, Color::new(1.0, 0.0, 0.0), Color::new(0.0, 0.0, 1.0)] {
            sink.write_pixel(color).unwrap();
        }
        sink.finish().unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(0, 1), &Rgb([255, 0, 0]));
        assert_eq!(decoded.get_pixel(1, 1), &Rgb([0, 0, 255]));
        std::fs::remove_file(&path).ok();
    }
}
