use js_sys::{Array, Object, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;

use crate::conversion::ConversionMap;
use crate::error::Result;
use crate::image::{DEFAULT_HISTOGRAM_LIMIT, ImageBuffer, OpenOptions, recolor};
use crate::image::{extract_palette as extract_exact, extract_palette_full};
use crate::palette::Palette;

fn to_js(err: crate::PaletError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Palette of an encoded image as hex strings.
///
/// With `full` unset the exact histogram is used, which fails on images with
/// more than 256 colors. With `full` set every visible pixel is scanned.
#[wasm_bindgen]
pub fn extract_palette(input: Vec<u8>, full: bool) -> Result<Array, JsValue> {
    let palette_hex = extract_palette_bytes(&input, full).map_err(to_js)?;

    let palette_js = Array::new();
    for hex in palette_hex {
        palette_js.push(&JsValue::from_str(&hex));
    }
    Ok(palette_js)
}

/// Recolor an encoded image to the nearest colors of `palette` (hex strings).
///
/// Returns `{ image, mapping }` where `image` holds PNG bytes and `mapping`
/// maps every source hex color to its replacement.
#[wasm_bindgen]
pub fn recolor_to_palette(input: Vec<u8>, palette: Array) -> Result<Object, JsValue> {
    let mut hexes = Vec::new();
    for val in palette.iter() {
        let s = val
            .as_string()
            .ok_or_else(|| JsValue::from_str("Palette values must be strings"))?;
        hexes.push(s);
    }

    let (encoded, cmap) = recolor_bytes(&input, &hexes).map_err(to_js)?;

    let mapping = Object::new();
    for (from, to) in cmap.iter() {
        Reflect::set(
            &mapping,
            &JsValue::from_str(&from.hex()),
            &JsValue::from_str(&to.hex()),
        )?;
    }

    let result = Object::new();
    Reflect::set(&result, &JsValue::from_str("image"), &Uint8Array::from(encoded.as_slice()))?;
    Reflect::set(&result, &JsValue::from_str("mapping"), &mapping)?;
    Ok(result)
}

/// Hex strings of the palette of an encoded image, sorted by channel.
pub fn extract_palette_bytes(input: &[u8], full: bool) -> Result<Vec<String>> {
    let buffer = ImageBuffer::from_bytes(input, &OpenOptions::default())?;
    let palette = if full {
        extract_palette_full(&buffer, 0)
    } else {
        extract_exact(&buffer, DEFAULT_HISTOGRAM_LIMIT)?
    };
    Ok(palette.to_list().into_iter().map(|c| c.hex()).collect())
}

/// Recolor every visible pixel of an encoded image to its nearest color in
/// `palette_hex`. Returns PNG bytes and the map that was applied.
pub fn recolor_bytes(input: &[u8], palette_hex: &[String]) -> Result<(Vec<u8>, ConversionMap)> {
    let buffer = ImageBuffer::from_bytes(input, &OpenOptions::default())?;
    let target = Palette::from_hex(palette_hex)?;
    let source = extract_palette_full(&buffer, 0);
    let cmap = ConversionMap::nearest(&source, &target)?;

    let encoded = recolor(&buffer, &cmap).encode_png()?;
    Ok((encoded, cmap))
}
