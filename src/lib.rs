//! Extract, combine and remap color palettes of raster images.
//!
//! A [`Palette`] is a set of [`Color`]s with set algebra. A [`ConversionMap`]
//! assigns every color of one palette to a color of another, by nearest
//! distance under a [`Metric`] or at random, and [`recolor`](crate::image::recolor) applies it
//! pixel by pixel.

pub mod blend;
pub mod color;
pub mod conversion;
pub mod error;
pub mod image;
pub mod metric;
pub mod palette;
pub mod wasm;

pub use crate::blend::{maximize_by_average, minimize_by_average};
pub use crate::color::Color;
pub use crate::conversion::{ConversionMap, Selection};
pub use crate::error::{IoSource, PaletError, Result};
pub use crate::image::{ImageBuffer, KMeansOptions, OpenOptions, SwatchSize};
pub use crate::metric::{Euclidean, Metric};
pub use crate::palette::Palette;
