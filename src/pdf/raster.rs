//! Raster decoding of chart payloads into PDF-ready pixel data.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, GenericImageView};

use super::PdfError;

/// A decoded chart image ready for embedding as a DeviceRGB XObject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Width in pixels (and points, at 72 dpi).
    pub width: u32,
    /// Height in pixels (and points, at 72 dpi).
    pub height: u32,
    /// Zlib-compressed 8-bit RGB samples, row-major.
    pub data: Vec<u8>,
}

impl PageImage {
    /// Decodes PNG/JPEG bytes into a page image.
    ///
    /// Transparent pixels are composited onto white so charts with an alpha
    /// channel render as they do on screen.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Decode`] for undecodable input,
    /// [`PdfError::EmptyImage`] for zero-sized images, and
    /// [`PdfError::Compression`] if deflating the samples fails.
    pub fn decode(bytes: &[u8]) -> Result<Self, PdfError> {
        let img = image::load_from_memory(bytes).map_err(|e| PdfError::Decode(e.to_string()))?;
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(PdfError::EmptyImage { width, height });
        }

        let rgb = flatten_to_rgb(&img);
        Ok(Self {
            width,
            height,
            data: compress(&rgb)?,
        })
    }
}

fn flatten_to_rgb(img: &DynamicImage) -> Vec<u8> {
    if !img.color().has_alpha() {
        return img.to_rgb8().into_raw();
    }

    let rgba = img.to_rgba8();
    let mut rgb = Vec::with_capacity(rgba.as_raw().len() / 4 * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = u16::from(a);
        for channel in [r, g, b] {
            let blended = (u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255;
            rgb.push(u8::try_from(blended).unwrap_or(u8::MAX));
        }
    }
    rgb
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::{Cursor, Read};

    use flate2::read::ZlibDecoder;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, format).unwrap();
        bytes.into_inner()
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        ZlibDecoder::new(data).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_decode_png_keeps_dimensions_and_pixels() {
        let img = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let png = encode(&DynamicImage::ImageRgb8(img), ImageFormat::Png);

        let page = PageImage::decode(&png).unwrap();
        assert_eq!((page.width, page.height), (3, 2));
        assert_eq!(inflate(&page.data), [10, 20, 30].repeat(6));
    }

    #[test]
    fn test_decode_composites_transparency_on_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 0]));
        let png = encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png);

        let page = PageImage::decode(&png).unwrap();
        assert_eq!(inflate(&page.data), vec![0, 0, 0, 255, 255, 255]);
    }

    #[test]
    fn test_decode_jpeg() {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 200, 200]));
        let jpeg = encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg);

        let page = PageImage::decode(&jpeg).unwrap();
        assert_eq!((page.width, page.height), (8, 8));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = PageImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, PdfError::Decode(_)));
    }
}
