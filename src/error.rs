//! Error types for palette extraction and remapping.

use std::path::Path;

use thiserror::Error;

use crate::color::Color;

/// Result type alias used throughout the crate.
pub type Result<T, E = PaletError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum PaletError {
    /// A hex color literal could not be parsed.
    #[error("invalid color literal {input:?}: {reason}")]
    Format { input: String, reason: &'static str },

    /// Raw channel input had the wrong shape or out-of-range values.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The color is not a member of the palette or a key of the map.
    #[error("color {0} not found")]
    NotFound(Color),

    /// A dynamic operand was not a palette.
    #[error("expected {expected}, found {found}")]
    TypeKind {
        expected: &'static str,
        found: &'static str,
    },

    /// A nearest-color map was requested against an empty target palette.
    #[error("target palette is empty, no nearest color exists")]
    EmptyTarget,

    /// The image holds more distinct colors than a compact histogram allows.
    #[error(
        "image has more than {limit} distinct colors; use full-scan extraction instead"
    )]
    TooManyColors { limit: usize },

    /// The swatch canvas for this many colors at this size does not fit.
    #[error("swatch canvas for {count} colors of {width}x{height} pixels is too large")]
    CanvasTooLarge { count: usize, width: u32, height: u32 },

    /// Reading, decoding, encoding or writing an image failed.
    #[error("failed to access {target}: {source}")]
    Io {
        /// File path, or `in-memory image` for byte buffers.
        target: String,
        #[source]
        source: IoSource,
    },
}

/// Underlying cause of [`PaletError::Io`].
#[derive(Error, Debug)]
pub enum IoSource {
    #[error(transparent)]
    File(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] image::ImageError),
}

pub(crate) const IN_MEMORY: &str = "in-memory image";

impl PaletError {
    pub(crate) fn io(path: &Path, source: impl Into<IoSource>) -> Self {
        Self::Io {
            target: path.display().to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn in_memory(source: impl Into<IoSource>) -> Self {
        Self::Io {
            target: IN_MEMORY.to_owned(),
            source: source.into(),
        }
    }

    pub(crate) fn format(input: &str, reason: &'static str) -> Self {
        Self::Format {
            input: input.to_owned(),
            reason,
        }
    }
}
