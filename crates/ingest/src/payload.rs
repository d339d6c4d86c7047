//! Byte-level checks on the upload body: magic bytes and decode integrity.
//!
//! The integrity check walks the compressed pixel data without ever holding a
//! whole frame. A 10 MiB upload can describe a frame of several gigabytes, so
//! PNG rows and GIF frames are streamed through small buffers and only JPEG,
//! whose decoder has no row API, is decoded in full under a fixed budget.

use std::io::Cursor;

use image::{ImageDecoder, ImageError, ImageReader};
use tracing::warn;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::types::ImageFormat;

/// Largest JPEG frame, in decoded bytes, that is decoded in full.
pub const JPEG_DECODE_BUDGET: u64 = 64 * 1024 * 1024;

/// Scratch buffer for draining GIF frames. Must hold an even number of pixels.
const GIF_CHUNK: usize = 4096;

/// Signature check: the leading bytes must identify an accepted format.
pub fn check_signature(bytes: &[u8], cfg: &IngestConfig) -> Result<ImageFormat, IngestError> {
    match ImageFormat::sniff(bytes) {
        Some(format) if cfg.accepts_format(format) => Ok(format),
        _ => Err(IngestError::BadSignature),
    }
}

/// Integrity check: the bytes must decode as an image of `format`.
///
/// Running into a decoder resource limit is not corruption. The image is
/// accepted with a warning and left for the OCR service to judge.
pub fn check_integrity(bytes: &[u8], format: ImageFormat) -> Result<(), IngestError> {
    match format {
        ImageFormat::Png => check_png(bytes),
        ImageFormat::Gif => check_gif(bytes),
        ImageFormat::Jpeg => check_jpeg(bytes),
    }
}

fn corrupt(err: impl ToString) -> IngestError {
    IngestError::Corrupt {
        reason: err.to_string(),
    }
}

fn limit_reached(format: ImageFormat, reason: impl std::fmt::Display) -> Result<(), IngestError> {
    warn!(%format, %reason, "integrity_check_limited");
    Ok(())
}

fn check_png(bytes: &[u8]) -> Result<(), IngestError> {
    let mut reader = match png::Decoder::new(Cursor::new(bytes)).read_info() {
        Ok(reader) => reader,
        Err(png::DecodingError::LimitsExceeded) => {
            return limit_reached(ImageFormat::Png, "header limits exceeded")
        }
        Err(err) => return Err(corrupt(err)),
    };

    loop {
        match reader.next_row() {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(()),
            Err(png::DecodingError::LimitsExceeded) => {
                return limit_reached(ImageFormat::Png, "row limits exceeded")
            }
            Err(err) => return Err(corrupt(err)),
        }
    }
}

fn check_gif(bytes: &[u8]) -> Result<(), IngestError> {
    match drain_gif(bytes) {
        Ok(()) => Ok(()),
        Err(err @ (gif::DecodingError::MemoryLimit | gif::DecodingError::OutOfMemory)) => {
            limit_reached(ImageFormat::Gif, err)
        }
        Err(err) => Err(corrupt(err)),
    }
}

/// Decodes every frame as palette indices into one small buffer.
fn drain_gif(bytes: &[u8]) -> Result<(), gif::DecodingError> {
    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(bytes))?;

    let mut chunk = [0u8; GIF_CHUNK];
    while decoder.next_frame_info()?.is_some() {
        while decoder.fill_buffer(&mut chunk)? {}
    }
    Ok(())
}

fn check_jpeg(bytes: &[u8]) -> Result<(), IngestError> {
    let reader = ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg);
    let decoder = match reader.into_decoder() {
        Ok(decoder) => decoder,
        Err(err) => return image_failure(err),
    };

    let total = decoder.total_bytes();
    if total > JPEG_DECODE_BUDGET {
        // Headers parsed; the scan data stays unchecked.
        return limit_reached(ImageFormat::Jpeg, format_args!("frame of {total} bytes"));
    }

    let mut frame = vec![0u8; total as usize];
    match decoder.read_image(&mut frame) {
        Ok(()) => Ok(()),
        Err(err) => image_failure(err),
    }
}

fn image_failure(err: ImageError) -> Result<(), IngestError> {
    match err {
        ImageError::Limits(limit) => limit_reached(ImageFormat::Jpeg, limit),
        other => Err(corrupt(other)),
    }
}
