//! Test helpers for asset store tests.

use std::io::Cursor;

use catalog_assets::config::AssetsConfig;
use catalog_assets::{AssetStore, MemoryConnector, MemoryServer};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Thumbnail bound used by the tests.
pub const MAX_EDGE: u32 = 200;

/// A fresh in-memory server and a store opening sessions on it.
pub fn setup() -> (MemoryServer, AssetStore<MemoryConnector>) {
    let server = MemoryServer::new();
    let config = AssetsConfig {
        thumbnail_max_edge: MAX_EDGE,
        ..Default::default()
    };
    let store = AssetStore::new(server.connector(), config);
    (server, store)
}

/// Encode a solid-colour image of the given size.
pub fn image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    bytes
}
