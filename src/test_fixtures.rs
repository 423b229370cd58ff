//! Shared test utilities: synthesized image payloads.
//!
//! Real encoded JPEG/PNG bytes, generated in-memory, so validator and
//! detector tests exercise the actual decode path instead of canned
//! fixtures.

use image::{ExtendedColorType, ImageEncoder, RgbImage};

/// Encode a gradient JPEG of the given dimensions.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Encode a gradient PNG of the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, 64, (y % 256) as u8])
    });
    let mut buf = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A JPEG padded with trailing bytes to a small relative size difference.
///
/// Decoders stop at the end-of-image marker, so the padded payload keeps
/// its dimensions while its byte size grows by `fraction`.
pub fn padded_jpeg(base: &[u8], fraction: f64) -> Vec<u8> {
    let mut bytes = base.to_vec();
    let pad = ((base.len() as f64) * fraction).ceil() as usize;
    bytes.extend(std::iter::repeat(0u8).take(pad));
    bytes
}
