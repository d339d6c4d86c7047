//! Shared fixtures: synthesized images and a pipeline around a stub engine.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use ocrgate::{Pipeline, ResultCache, StubEngine, Submission};

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

/// A small PNG whose bytes differ per `seed`.
pub fn png(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(12, 12, Rgb([seed, seed.wrapping_mul(7), 200]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Png)
}

pub fn jpeg(seed: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(12, 12, Rgb([seed, 90, 30]));
    encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)
}

pub fn gif(seed: u8) -> Vec<u8> {
    let img = RgbaImage::from_pixel(6, 6, Rgba([seed, 0, 0, 255]));
    encode(DynamicImage::ImageRgba8(img), ImageFormat::Gif)
}

pub fn png_upload(seed: u8, filename: &str) -> Submission {
    Submission::new(png(seed), Some("image/png"), Some(filename))
}

pub fn jpeg_upload(seed: u8, filename: &str) -> Submission {
    Submission::new(jpeg(seed), Some("image/jpeg"), Some(filename))
}

pub fn empty_upload(filename: &str) -> Submission {
    Submission::new(Vec::new(), Some("image/png"), Some(filename))
}

pub fn pipeline(engine: &StubEngine) -> Pipeline {
    Pipeline::new(Arc::new(engine.clone()), Arc::new(ResultCache::default()))
}
