//! Image encoding: `DynamicImage` → JPEG bytes.
//!
//! Pages are flattened to RGB before encoding; JPEG has no alpha channel and
//! pdfium already paints pages onto an opaque white background.

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;

/// Encode a rasterised page as JPEG at `quality` (1–100).
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;

    debug!(
        "Encoded {}x{} page → {} bytes JPEG (q={})",
        rgb.width(),
        rgb.height(),
        buf.len(),
        quality
    );
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    #[test]
    fn encode_small_image() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 8, Rgba([255, 0, 0, 255])));
        let data = encode_jpeg(&img, 85).expect("encode should succeed");
        // JPEG SOI marker
        assert_eq!(&data[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory_with_format(&data, ImageFormat::Jpeg)
            .expect("valid JPEG");
        assert_eq!(decoded.width(), 10);
        assert_eq!(decoded.height(), 8);
    }

    #[test]
    fn higher_quality_is_not_smaller() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(64, 64, |x, y| {
            Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255])
        }));
        let low = encode_jpeg(&img, 20).unwrap();
        let high = encode_jpeg(&img, 95).unwrap();
        assert!(high.len() >= low.len());
    }
}
