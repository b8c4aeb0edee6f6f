//! Image adapter: read palettes out of raster images, draw swatches, and
//! recolor images through a [`ConversionMap`].

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

use image::{ImageError, ImageFormat, Rgba, RgbaImage};
use kmeans_colors::get_kmeans;
use log::{debug, warn};
use palette::{IntoColor, Lab, Srgb};

use crate::color::Color;
use crate::conversion::ConversionMap;
use crate::error::{PaletError, Result};
use crate::palette::Palette;

/// Histogram size above which exact extraction gives up.
pub const DEFAULT_HISTOGRAM_LIMIT: usize = 256;

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Options for decoding an image.
#[derive(Clone, Copy, Debug)]
pub struct OpenOptions {
    /// Keep whatever rows of a truncated PNG could be decoded instead of failing.
    /// Missing rows are left transparent.
    ///
    /// Recovery covers non-interlaced PNG only. Truncated interlaced PNG, GIF,
    /// JPEG and other formats still fail with [`PaletError::Io`] carrying the
    /// decoder error.
    pub load_truncated: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            load_truncated: true,
        }
    }
}

/// Size of one rendered palette swatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwatchSize {
    pub width: u32,
    pub height: u32,
}

impl Default for SwatchSize {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
        }
    }
}

/// Parameters for k-means palette reduction.
#[derive(Clone, Copy, Debug)]
pub struct KMeansOptions {
    pub colors: usize,
    pub max_iter: usize,
    pub converge: f32,
    pub seed: u64,
}

impl Default for KMeansOptions {
    fn default() -> Self {
        Self {
            colors: 8,
            max_iter: 20,
            converge: 1e-4,
            seed: 0,
        }
    }
}

/// An RGBA raster held in memory.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    image: RgbaImage,
}

impl ImageBuffer {
    /// Fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| PaletError::io(path, e))?;
        let image = decode(&bytes, options).map_err(|e| PaletError::io(path, e))?;
        let buffer = Self::from_rgba(image);
        debug!(
            "Opened {} ({}x{})",
            path.display(),
            buffer.width(),
            buffer.height()
        );
        Ok(buffer)
    }

    pub fn from_bytes(bytes: &[u8], options: &OpenOptions) -> Result<Self> {
        decode(bytes, options)
            .map(Self::from_rgba)
            .map_err(PaletError::in_memory)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Every pixel in row-major order. Call again to restart.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32, Color)> + '_ {
        self.image
            .enumerate_pixels()
            .map(|(x, y, px)| (x, y, Color::from(*px)))
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        Color::from(*self.image.get_pixel(x, y))
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: impl Into<Color>) {
        let color: Color = color.into();
        self.image.put_pixel(x, y, Rgba::from(color));
    }

    /// Count of every distinct color, or `None` once more than `limit` distinct
    /// colors have been seen.
    pub fn color_histogram(&self, limit: usize) -> Option<HashMap<Color, usize>> {
        let mut counts = HashMap::new();
        for px in self.image.pixels() {
            *counts.entry(Color::from(*px)).or_insert(0) += 1;
            if counts.len() > limit {
                return None;
            }
        }
        Some(counts)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path).map_err(|e| PaletError::io(path, e))?;
        debug!("Saved {}", path.display());
        Ok(())
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(PaletError::in_memory)?;
        Ok(buf)
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }
}

fn decode(bytes: &[u8], options: &OpenOptions) -> std::result::Result<RgbaImage, ImageError> {
    match image::load_from_memory(bytes) {
        Ok(img) => Ok(img.to_rgba8()),
        Err(err) => {
            if options.load_truncated && bytes.starts_with(PNG_SIGNATURE) {
                if let Some(image) = decode_png_partial(bytes) {
                    warn!("Recovered truncated PNG after decode error: {err}");
                    return Ok(image);
                }
            }
            Err(err)
        }
    }
}

/// Row-by-row PNG decode that stops at the first error instead of failing.
/// Returns `None` when not even the header is readable.
fn decode_png_partial(bytes: &[u8]) -> Option<RgbaImage> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().ok()?;

    let (width, height, interlaced) = {
        let info = reader.info();
        (info.width, info.height, info.interlaced)
    };
    if interlaced {
        return None;
    }

    let stride = match reader.output_color_type().0 {
        png::ColorType::Grayscale => 1,
        png::ColorType::GrayscaleAlpha => 2,
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::Indexed => return None,
    };

    let mut out = RgbaImage::new(width, height);
    let mut y = 0;
    while y < height {
        let Ok(Some(row)) = reader.next_row() else {
            break;
        };
        for (x, px) in row.data().chunks_exact(stride).take(width as usize).enumerate() {
            let rgba = match *px {
                [g] => [g, g, g, u8::MAX],
                [g, a] => [g, g, g, a],
                [r, g, b] => [r, g, b, u8::MAX],
                [r, g, b, a] => [r, g, b, a],
                _ => unreachable!("chunks_exact yields stride-sized chunks"),
            };
            out.put_pixel(x as u32, y, Rgba(rgba));
        }
        y += 1;
    }

    debug!("Decoded {y} of {height} rows from truncated PNG");
    Some(out)
}

/// Exact palette from the image histogram.
///
/// Fails with [`PaletError::TooManyColors`] when the image holds more than
/// `limit` distinct colors; use [`extract_palette_full`] for those.
pub fn extract_palette(buffer: &ImageBuffer, limit: usize) -> Result<Palette> {
    let histogram = buffer
        .color_histogram(limit)
        .ok_or(PaletError::TooManyColors { limit })?;
    debug!("Histogram holds {} colors", histogram.len());
    Ok(histogram.into_keys().collect())
}

/// Full scan keeping every pixel whose alpha is strictly above `alpha_threshold`.
pub fn extract_palette_full(buffer: &ImageBuffer, alpha_threshold: u8) -> Palette {
    buffer
        .pixels()
        .map(|(_, _, c)| c)
        .filter(|c| c.alpha() > alpha_threshold)
        .collect()
}

/// Reduce the visible (alpha > 0) pixels to at most `options.colors` colors
/// with k-means in Lab space. The resulting colors are opaque.
pub fn extract_palette_kmeans(buffer: &ImageBuffer, options: &KMeansOptions) -> Palette {
    let lab_pixels: Vec<Lab> = buffer
        .as_rgba()
        .pixels()
        .filter(|px| px[3] != 0)
        .map(|px| {
            let srgb = Srgb::<u8>::new(px[0], px[1], px[2]);
            srgb.into_linear().into_color()
        })
        .collect();

    let k = options.colors.min(lab_pixels.len());
    if k == 0 {
        return Palette::new();
    }

    let kmeans = get_kmeans(
        k,
        options.max_iter,
        options.converge,
        false,
        &lab_pixels,
        options.seed,
    );
    kmeans
        .centroids
        .iter()
        .map(|&lab| {
            let rgb_f32: Srgb<f32> = Srgb::from_linear(lab.into_color());
            let c: Srgb<u8> = rgb_f32.into_format::<u8>();
            Color::rgb(c.red, c.green, c.blue)
        })
        .collect()
}

/// Draw one `size` rectangle per color, left to right, on a transparent canvas
/// of `(size.width * colors.len(), size.height)`.
///
/// Fails with [`PaletError::CanvasTooLarge`] when that canvas cannot be
/// addressed with `u32` coordinates or allocated as RGBA bytes.
pub fn export_swatches(colors: &[Color], size: SwatchSize) -> Result<ImageBuffer> {
    let too_large = || PaletError::CanvasTooLarge {
        count: colors.len(),
        width: size.width,
        height: size.height,
    };
    let width = u32::try_from(colors.len())
        .ok()
        .and_then(|n| n.checked_mul(size.width))
        .ok_or_else(too_large)?;
    u64::from(width)
        .checked_mul(u64::from(size.height))
        .and_then(|px| px.checked_mul(4))
        .and_then(|len| usize::try_from(len).ok())
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or_else(too_large)?;

    let mut canvas = ImageBuffer::new(width, size.height);
    for (i, &color) in colors.iter().enumerate() {
        // i * width <= canvas width, checked above.
        let x0 = i as u32 * size.width;
        for x in x0..x0 + size.width {
            for y in 0..size.height {
                canvas.set_pixel(x, y, color);
            }
        }
    }
    Ok(canvas)
}

/// Swatch image of `palette` in [`Palette::to_list`] order, saved to `path`.
pub fn export_palette(palette: &Palette, path: &Path, size: SwatchSize) -> Result<()> {
    export_swatches(&palette.to_list(), size)?.save(path)
}

/// New image with each pixel passed through `cmap`; pixels whose color is not a
/// key are copied unchanged.
pub fn recolor(buffer: &ImageBuffer, cmap: &ConversionMap) -> ImageBuffer {
    let mut out = ImageBuffer::new(buffer.width(), buffer.height());
    for (x, y, color) in buffer.pixels() {
        out.set_pixel(x, y, cmap.translate(color));
    }
    out
}

/// Recolor the image at `input` and save it to `output`, or back over `input`
/// when no output is given.
pub fn convert_file(
    input: &Path,
    cmap: &ConversionMap,
    output: Option<&Path>,
    options: &OpenOptions,
) -> Result<()> {
    let source = ImageBuffer::open(input, options)?;
    recolor(&source, cmap).save(output.unwrap_or(input))
}
