//! Page-image PDF generation.
//!
//! A chart payload (PNG or JPEG) is decoded into a [`PageImage`] and written
//! as one PDF page whose media box matches the image's pixel size, the way a
//! 72 dpi image-to-PDF conversion lays it out.
//!
//! [`PdfAppender`] writes documents incrementally: the file is valid after the
//! header and after every appended page, so a run can grow a single
//! multi-page document without rewriting earlier pages.

mod raster;
mod writer;

pub use raster::PageImage;
pub use writer::PdfAppender;

use thiserror::Error;

/// Errors raised while turning a payload into a PDF page.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The payload is not a decodable raster image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The decoded image has a zero dimension.
    #[error("image has empty dimensions {width}x{height}")]
    EmptyImage {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// Flate compression of the pixel data failed.
    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),
}

/// Builds a complete single-page PDF for `image`.
#[must_use]
pub fn single_page_document(image: &PageImage) -> Vec<u8> {
    let (mut appender, mut bytes) = PdfAppender::start();
    bytes.extend_from_slice(&appender.append_page(image));
    bytes
}
