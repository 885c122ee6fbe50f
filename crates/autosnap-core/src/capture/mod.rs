pub mod errors;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};

pub use errors::CaptureError;

/// Encode `image` to `destination`, picking the codec from the extension.
///
/// JPEG output is written with `quality`; anything else is PNG. An empty
/// bitmap is rejected so no zero-byte or corrupt file is ever produced.
pub fn save_image(
    image: &RgbaImage,
    destination: &Path,
    window_id: &str,
    quality: u8,
) -> Result<(), CaptureError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(CaptureError::InvalidGeometry {
            window_id: window_id.to_string(),
            width: image.width() as i32,
            height: image.height() as i32,
        });
    }

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    if is_jpeg_path(destination) {
        let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
        let writer = BufWriter::new(File::create(destination)?);
        let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
        encoder.encode_image(&rgb)?;
    } else {
        image.save_with_format(destination, ImageFormat::Png)?;
    }
    Ok(())
}

fn is_jpeg_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "jpg" | "jpeg"))
        .unwrap_or(false)
}
