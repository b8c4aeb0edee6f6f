//! File-level tests for the image adapter: open, extract, export and recolor.

use assert_fs::TempDir;
use assert_fs::prelude::*;
use image::{Rgba, RgbaImage};
use palet::image::{
    DEFAULT_HISTOGRAM_LIMIT, convert_file, export_palette, extract_palette, extract_palette_full,
};
use palet::{
    Color, ConversionMap, ImageBuffer, IoSource, OpenOptions, PaletError, Palette, SwatchSize,
};

fn two_tone() -> RgbaImage {
    RgbaImage::from_fn(6, 4, |x, _| {
        if x < 3 {
            Rgba([250, 10, 10, 255])
        } else {
            Rgba([10, 10, 250, 255])
        }
    })
}

fn gradient() -> RgbaImage {
    RgbaImage::from_fn(32, 32, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 0, 255]))
}

/// Hash-like pixel noise so the PNG data barely compresses.
fn noise(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)).wrapping_mul(2_654_435_761);
        let [r, g, b, _] = v.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

#[test]
fn exact_extraction_from_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("two_tone.png");
    two_tone().save(file.path()).unwrap();

    let buffer = ImageBuffer::open(file.path(), &OpenOptions::default()).unwrap();
    let palette = extract_palette(&buffer, DEFAULT_HISTOGRAM_LIMIT).unwrap();

    assert_eq!(palette, Palette::from_hex(["#fa0a0a", "#0a0afa"]).unwrap());
}

#[test]
fn high_cardinality_needs_full_scan() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("gradient.png");
    gradient().save(file.path()).unwrap();

    let buffer = ImageBuffer::open(file.path(), &OpenOptions::default()).unwrap();
    let err = extract_palette(&buffer, DEFAULT_HISTOGRAM_LIMIT).unwrap_err();
    assert!(matches!(err, PaletError::TooManyColors { limit: 256 }));

    assert_eq!(extract_palette_full(&buffer, 0).len(), 32 * 32);
}

#[test]
fn missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let err = ImageBuffer::open(&temp.path().join("absent.png"), &OpenOptions::default())
        .unwrap_err();
    assert!(matches!(err, PaletError::Io { .. }));
}

#[test]
fn corrupt_file_is_io_error_naming_the_path() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("corrupt.png");
    file.write_binary(b"\x89PNG\r\n\x1a\nnot really").unwrap();

    let err = ImageBuffer::open(file.path(), &OpenOptions::default()).unwrap_err();
    assert!(matches!(
        &err,
        PaletError::Io { target, source: IoSource::Codec(_) } if target.ends_with("corrupt.png")
    ));
}

#[test]
fn save_into_missing_directory_is_io_error() {
    let temp = TempDir::new().unwrap();
    let buffer = ImageBuffer::from_rgba(two_tone());

    let err = buffer
        .save(&temp.path().join("missing/dir/out.png"))
        .unwrap_err();
    assert!(matches!(err, PaletError::Io { .. }));
    assert!(err.to_string().contains("out.png"));
}

#[test]
fn truncated_png_is_recovered_only_when_allowed() {
    let temp = TempDir::new().unwrap();
    let original = noise(64, 64);
    let full = temp.child("full.png");
    original.save(full.path()).unwrap();

    let bytes = std::fs::read(full.path()).unwrap();
    let cut = temp.child("cut.png");
    cut.write_binary(&bytes[..bytes.len() / 2]).unwrap();

    let recovered = ImageBuffer::open(cut.path(), &OpenOptions { load_truncated: true }).unwrap();
    assert_eq!((recovered.width(), recovered.height()), (64, 64));
    assert_eq!(recovered.get_pixel(0, 0), Color::from(*original.get_pixel(0, 0)));
    assert_eq!(recovered.get_pixel(63, 63), Color::new(0, 0, 0, 0));

    let err = ImageBuffer::open(cut.path(), &OpenOptions { load_truncated: false }).unwrap_err();
    assert!(matches!(err, PaletError::Io { source: IoSource::Codec(_), .. }));
}

#[test]
fn swatch_file_has_one_cell_per_color() {
    let temp = TempDir::new().unwrap();
    let file = temp.child("swatch.png");
    let palette = Palette::from_hex(["#000", "#fff", "#f00"]).unwrap();

    export_palette(&palette, file.path(), SwatchSize::default()).unwrap();
    file.assert(predicates::path::exists());

    let swatch = ImageBuffer::open(file.path(), &OpenOptions::default()).unwrap();
    assert_eq!((swatch.width(), swatch.height()), (24, 8));

    let order = palette.to_list();
    for (i, color) in order.iter().enumerate() {
        assert_eq!(swatch.get_pixel(i as u32 * 8 + 4, 4), *color);
    }
}

#[test]
fn convert_file_writes_recolored_copy() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("in.png");
    let output = temp.child("out.png");
    two_tone().save(input.path()).unwrap();

    let buffer = ImageBuffer::open(input.path(), &OpenOptions::default()).unwrap();
    let source = extract_palette(&buffer, DEFAULT_HISTOGRAM_LIMIT).unwrap();
    let target = Palette::from_hex(["#ff0000", "#0000ff", "#00ff00"]).unwrap();
    let cmap = ConversionMap::nearest(&source, &target).unwrap();

    convert_file(input.path(), &cmap, Some(output.path()), &OpenOptions::default()).unwrap();

    let out = ImageBuffer::open(output.path(), &OpenOptions::default()).unwrap();
    assert_eq!(out.get_pixel(0, 0), Color::rgb(255, 0, 0));
    assert_eq!(out.get_pixel(5, 3), Color::rgb(0, 0, 255));

    let untouched = ImageBuffer::open(input.path(), &OpenOptions::default()).unwrap();
    assert_eq!(untouched.get_pixel(0, 0), Color::rgb(250, 10, 10));
}

#[test]
fn convert_file_overwrites_input_without_output() {
    let temp = TempDir::new().unwrap();
    let input = temp.child("in.png");
    two_tone().save(input.path()).unwrap();

    let cmap = ConversionMap::from_pairs([(Color::rgb(250, 10, 10), Color::rgb(0, 0, 0))]);
    convert_file(input.path(), &cmap, None, &OpenOptions::default()).unwrap();

    let out = ImageBuffer::open(input.path(), &OpenOptions::default()).unwrap();
    assert_eq!(out.get_pixel(0, 0), Color::rgb(0, 0, 0));
    assert_eq!(out.get_pixel(5, 0), Color::rgb(10, 10, 250));
}
