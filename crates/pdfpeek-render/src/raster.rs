// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster helpers for previews: sizing and flattening, then PNG encoding.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use pdfpeek_core::PageSize;
use pdfpeek_core::error::{PreviewError, Result};

/// Largest RGBA raster a single preview may need, in bytes (256 MiB).
///
/// Rendering holds several copies of the raster at once, so pages whose
/// preview would exceed this are rejected instead of rendered.
pub const MAX_RASTER_BYTES: u64 = 256 * 1024 * 1024;

/// Pixel size of a preview: fixed width, height from the page aspect ratio.
///
/// The height is truncated toward zero and never drops below one pixel.
pub fn target_dimensions(page: PageSize, target_width: u32) -> Result<(u32, u32)> {
    let degenerate = || PreviewError::DegeneratePage {
        width: page.width,
        height: page.height,
    };
    if !page.is_usable() {
        return Err(degenerate());
    }

    let height = ((f64::from(target_width) / page.aspect_ratio()) as u32).max(1);
    if u64::from(target_width) * u64::from(height) * 4 > MAX_RASTER_BYTES {
        return Err(degenerate());
    }
    Ok((target_width, height))
}

/// Alpha-composite an RGBA raster onto an opaque white background.
pub fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    let (width, height) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        out.put_pixel(x, y, Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]));
    }
    out
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let (c, a) = (u32::from(channel), u32::from(alpha));
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Encode an RGB raster as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|err| PreviewError::Image(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn portrait_letter_height() {
        // 2048 / (612 / 792) = 2650.35...
        let dims = target_dimensions(PageSize::new(612.0, 792.0), 2048).unwrap();
        assert_eq!(dims, (2048, 2650));
    }

    #[test]
    fn landscape_height_truncates() {
        // 2048 / (842 / 595) = 1447.23...
        let dims = target_dimensions(PageSize::new(842.0, 595.0), 2048).unwrap();
        assert_eq!(dims, (2048, 1447));
    }

    #[test]
    fn very_wide_page_keeps_one_row() {
        let dims = target_dimensions(PageSize::new(100_000.0, 1.0), 2048).unwrap();
        assert_eq!(dims, (2048, 1));
    }

    #[test]
    fn degenerate_page_is_rejected() {
        assert!(matches!(
            target_dimensions(PageSize::new(612.0, 0.0), 2048),
            Err(PreviewError::DegeneratePage { .. })
        ));
        assert!(target_dimensions(PageSize::new(-1.0, 10.0), 2048).is_err());
    }

    #[test]
    fn oversized_preview_is_rejected() {
        // 2048 / (3 / 14400) = 9_830_400 rows, far past the raster limit.
        assert!(matches!(
            target_dimensions(PageSize::new(3.0, 14_400.0), 2048),
            Err(PreviewError::DegeneratePage { .. })
        ));
        // 2048 x 32768 x 4 is exactly the limit.
        assert_eq!(
            target_dimensions(PageSize::new(1.0, 16.0), 2048).unwrap(),
            (2048, 32_768)
        );
    }

    #[test]
    fn transparent_becomes_white() {
        let image = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 0]));
        let flat = flatten_onto_white(&image);
        assert!(flat.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn opaque_is_unchanged() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_onto_white(&image).get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn half_alpha_black_is_mid_grey() {
        let image = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        let [r, g, b] = flatten_onto_white(&image).get_pixel(0, 0).0;
        assert_eq!((r, g, b), (127, 127, 127));
    }

    #[test]
    fn png_bytes_decode_back() {
        let image = RgbImage::from_pixel(3, 5, Rgb([1, 2, 3]));
        let bytes = encode_png(&image).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 5));
    }
}
