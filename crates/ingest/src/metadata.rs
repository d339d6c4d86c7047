//! Optional image metadata: dimensions, pixel mode and a few EXIF tags.
//!
//! Extraction is an enrichment step. It never fails a request; anything the
//! decoder or the EXIF reader cannot handle simply yields no metadata.

use std::collections::BTreeMap;
use std::io::Cursor;

use exif::{In, Reader, Tag, Value};
use image::{ExtendedColorType, ImageDecoder, ImageReader};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ImageFormat;

/// EXIF tags surfaced to clients, with their output names.
const EXIF_TAGS: [(Tag, &str); 5] = [
    (Tag::Make, "Make"),
    (Tag::Model, "Model"),
    (Tag::DateTime, "DateTime"),
    (Tag::Software, "Software"),
    (Tag::Orientation, "Orientation"),
];

/// Metadata reported alongside recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Container format, e.g. `"PNG"` or `"JPEG"`.
    pub format: String,
    /// Pixel layout as stored in the file, e.g. `"RGB"`, `"L"` or `"P"`.
    pub mode: String,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exif: Option<BTreeMap<String, String>>,
}

/// What the file header says about the frame.
struct Header {
    mode: &'static str,
    width: u32,
    height: u32,
}

/// Extract metadata from image bytes, or `None` if the image cannot be read.
///
/// Only headers are parsed, so the cost does not grow with the pixel count.
pub fn extract_metadata(bytes: &[u8]) -> Option<ImageMetadata> {
    let Some(format) = ImageFormat::sniff(bytes) else {
        debug!("metadata_format_unknown");
        return None;
    };
    let header = match read_header(bytes, format) {
        Ok(header) => header,
        Err(reason) => {
            debug!(%format, %reason, "metadata_header_failed");
            return None;
        }
    };

    let exif = read_exif(bytes);
    Some(ImageMetadata {
        format: format_name(format).to_string(),
        mode: header.mode.to_string(),
        width: header.width,
        height: header.height,
        exif: (!exif.is_empty()).then_some(exif),
    })
}

fn read_header(bytes: &[u8], format: ImageFormat) -> Result<Header, String> {
    match format {
        ImageFormat::Png => {
            let reader = png::Decoder::new(Cursor::new(bytes))
                .read_info()
                .map_err(|err| err.to_string())?;
            let info = reader.info();
            Ok(Header {
                mode: png_mode(info.color_type, info.bit_depth),
                width: info.width,
                height: info.height,
            })
        }
        ImageFormat::Gif => {
            let decoder = gif::DecodeOptions::new()
                .read_info(Cursor::new(bytes))
                .map_err(|err| err.to_string())?;
            // GIF pixels are always palette indices.
            Ok(Header {
                mode: "P",
                width: u32::from(decoder.width()),
                height: u32::from(decoder.height()),
            })
        }
        ImageFormat::Jpeg => {
            let decoder = ImageReader::with_format(Cursor::new(bytes), image::ImageFormat::Jpeg)
                .into_decoder()
                .map_err(|err| err.to_string())?;
            let (width, height) = decoder.dimensions();
            Ok(Header {
                mode: jpeg_mode(decoder.original_color_type()),
                width,
                height,
            })
        }
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::Gif => "GIF",
    }
}

fn png_mode(color: png::ColorType, depth: png::BitDepth) -> &'static str {
    match (color, depth) {
        (png::ColorType::Grayscale, png::BitDepth::One) => "1",
        (png::ColorType::Grayscale, png::BitDepth::Sixteen) => "I;16",
        (png::ColorType::Grayscale, _) => "L",
        (png::ColorType::GrayscaleAlpha, _) => "LA",
        (png::ColorType::Rgb, _) => "RGB",
        (png::ColorType::Rgba, _) => "RGBA",
        (png::ColorType::Indexed, _) => "P",
    }
}

fn jpeg_mode(color: ExtendedColorType) -> &'static str {
    match color {
        ExtendedColorType::L8 | ExtendedColorType::L16 => "L",
        ExtendedColorType::Rgb8 | ExtendedColorType::Rgb16 => "RGB",
        ExtendedColorType::Cmyk8 => "CMYK",
        _ => "UNKNOWN",
    }
}

/// Reads the surfaced EXIF tags; missing or unreadable EXIF gives an empty map.
fn read_exif(bytes: &[u8]) -> BTreeMap<String, String> {
    let mut tags = BTreeMap::new();
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(_) => return tags,
    };

    for (tag, name) in EXIF_TAGS {
        if let Some(value) = exif
            .get_field(tag, In::PRIMARY)
            .and_then(|field| field_text(&field.value))
        {
            tags.insert(name.to_string(), value);
        }
    }
    tags
}

/// Text form of an EXIF value. Raw byte blobs are skipped.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => {
            let text = parts
                .iter()
                .map(|part| String::from_utf8_lossy(part).trim_end_matches('\0').to_string())
                .collect::<Vec<_>>()
                .join(" ");
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Value::Byte(_) | Value::Undefined(..) => None,
        other => other.get_uint(0).map(|v| v.to_string()),
    }
}
