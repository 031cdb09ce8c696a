use std::io::Cursor;

use image::{ImageFormat, ImageReader};

/// Formats accepted for recipe images.
pub const ALLOWED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

/// Check an uploaded image: size, format detected from the magic bytes, and
/// that it actually decodes.
///
/// Returns the content type on success (e.g. "image/png").
pub fn validate_image(data: &[u8], max_bytes: usize) -> Result<String, String> {
    if data.is_empty() {
        return Err("The submitted file is empty.".to_string());
    }
    if data.len() > max_bytes {
        return Err(format!(
            "Image too large: {} bytes (max {})",
            data.len(),
            max_bytes
        ));
    }

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| format!("Failed to read image: {}", e))?;

    let format = reader.format().ok_or_else(|| {
        "Upload a valid image. The file you uploaded was either not an image or a corrupted image."
            .to_string()
    })?;

    if !ALLOWED_FORMATS.contains(&format) {
        return Err(format!(
            "Unsupported image format: {:?}. Allowed: JPEG, PNG, GIF, WebP",
            format
        ));
    }

    let content_type = format.to_mime_type().to_string();

    reader
        .decode()
        .map_err(|e| format!("Failed to decode image: {}", e))?;

    Ok(content_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn encode(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 4, Rgb([200, 80, 20]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_detects_png_and_jpeg() {
        assert_eq!(
            validate_image(&encode(ImageFormat::Png), 1 << 20).unwrap(),
            "image/png"
        );
        assert_eq!(
            validate_image(&encode(ImageFormat::Jpeg), 1 << 20).unwrap(),
            "image/jpeg"
        );
    }

    #[test]
    fn test_rejects_empty_oversized_and_non_images() {
        assert!(validate_image(&[], 1 << 20).is_err());
        assert!(validate_image(&encode(ImageFormat::Png), 8).is_err());
        assert!(validate_image(b"definitely not an image", 1 << 20).is_err());
    }

    #[test]
    fn test_rejects_truncated_image() {
        let png = encode(ImageFormat::Png);
        assert!(validate_image(&png[..png.len() / 2], 1 << 20).is_err());
    }
}
