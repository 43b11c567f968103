//! Thumbnail generation.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageResult};

/// An encoded thumbnail.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Encoding used for a thumbnail of `source`.
///
/// JPEG and PNG sources keep their format, so the thumbnail matches the
/// extension of the file name it is stored under. Everything else becomes PNG.
pub fn thumbnail_format(source: &[u8]) -> ImageFormat {
    match image::guess_format(source) {
        Ok(ImageFormat::Jpeg) => ImageFormat::Jpeg,
        _ => ImageFormat::Png,
    }
}

/// Decode `source` and produce a thumbnail whose longer edge is at most `max_edge`.
///
/// Aspect ratio is preserved and smaller images are not enlarged. Fails
/// when `source` is not a decodable image.
pub fn render(source: &[u8], max_edge: u32) -> ImageResult<Thumbnail> {
    let decoded = image::load_from_memory(source)?;
    let shrunk = shrink(decoded, max_edge);
    let (width, height) = shrunk.dimensions();

    let format = thumbnail_format(source);
    // The JPEG encoder takes no alpha channel.
    let encodable = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(shrunk.to_rgb8()),
        _ => DynamicImage::ImageRgba8(shrunk.to_rgba8()),
    };
    let mut bytes = Vec::new();
    encodable.write_to(&mut Cursor::new(&mut bytes), format)?;

    Ok(Thumbnail {
        bytes,
        format,
        width,
        height,
    })
}

fn shrink(image: DynamicImage, max_edge: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width.max(height) <= max_edge {
        image
    } else {
        image.thumbnail(max_edge, max_edge)
    }
}
