//! Saving camera frames to PNG or JPEG.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use simcam_wire::ImageFrame;

use crate::error::{DeviceError, Result};

/// File formats accepted by `save_image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    Png,
    Jpeg { quality: u8 },
}

/// Pick the format from the file extension and check the quality.
///
/// Runs before any I/O so a bad request never touches the filesystem or the
/// host.
pub fn save_format(path: &Path, quality: i32) -> Result<SaveFormat> {
    if path.as_os_str().is_empty() {
        tracing::warn!("save_image called with an empty filename");
        return Err(DeviceError::EmptyFilename);
    }
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => Ok(SaveFormat::Png),
        Some("jpg") | Some("jpeg") => match u8::try_from(quality) {
            Ok(q) if (1..=100).contains(&q) => Ok(SaveFormat::Jpeg { quality: q }),
            _ => {
                tracing::warn!(quality, "save_image called with invalid 'quality' argument");
                Err(DeviceError::InvalidQuality(quality))
            }
        },
        _ => {
            tracing::warn!(
                path = %path.display(),
                "save_image called with unsupported image format (should be PNG or JPEG)"
            );
            Err(DeviceError::UnsupportedFormat(path.display().to_string()))
        }
    }
}

/// Convert a BGRA frame to RGBA.
pub fn to_rgba(frame: &ImageFrame) -> Result<RgbaImage> {
    let mut rgba = frame.data.to_vec();
    for pixel in rgba.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
    let expected = ImageFrame::expected_len(frame.width, frame.height);
    let actual = rgba.len();
    RgbaImage::from_raw(u32::from(frame.width), u32::from(frame.height), rgba)
        .ok_or(DeviceError::ImageSize { expected, actual })
}

/// Encode `frame` to `path`.
pub fn save_frame(frame: &ImageFrame, path: &Path, format: SaveFormat) -> Result<()> {
    let rgba = to_rgba(frame)?;
    match format {
        SaveFormat::Png => rgba.save_with_format(path, ImageFormat::Png)?,
        SaveFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();
            let file = File::create(path).map_err(image::ImageError::IoError)?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
            rgb.write_with_encoder(encoder)?;
        }
    }
    tracing::debug!(path = %path.display(), ?format, "image saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn frame() -> ImageFrame {
        // Two pixels: pure blue, pure red (BGRA).
        ImageFrame {
            width: 2,
            height: 1,
            data: Bytes::from_static(&[255, 0, 0, 255, 0, 0, 255, 255]),
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("simcam-image-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(save_format(Path::new("a.png"), 0).unwrap(), SaveFormat::Png);
        assert_eq!(
            save_format(Path::new("a.JPG"), 90).unwrap(),
            SaveFormat::Jpeg { quality: 90 }
        );
        assert_eq!(
            save_format(Path::new("dir/a.jpeg"), 1).unwrap(),
            SaveFormat::Jpeg { quality: 1 }
        );
    }

    #[test]
    fn rejects_before_io() {
        assert!(matches!(
            save_format(Path::new(""), 50),
            Err(DeviceError::EmptyFilename)
        ));
        assert!(matches!(
            save_format(Path::new("a.bmp"), 50),
            Err(DeviceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            save_format(Path::new("noext"), 50),
            Err(DeviceError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            save_format(Path::new("a.jpg"), 0),
            Err(DeviceError::InvalidQuality(0))
        ));
        assert!(matches!(
            save_format(Path::new("a.jpg"), 101),
            Err(DeviceError::InvalidQuality(101))
        ));
    }

    #[test]
    fn bgra_is_swapped_to_rgba() {
        let rgba = to_rgba(&frame()).unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(rgba.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn png_roundtrips_pixels() {
        let path = temp_path("frame.png");
        save_frame(&frame(), &path, SaveFormat::Png).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 1));
        assert_eq!(loaded.get_pixel(1, 0).0, [255, 0, 0, 255]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn jpeg_is_written() {
        let path = temp_path("frame.jpg");
        save_frame(&frame(), &path, SaveFormat::Jpeg { quality: 80 }).unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (2, 1));
        let _ = std::fs::remove_file(&path);
    }
}
