//! RGBA color value with hex conversion.

use std::fmt;
use std::str::FromStr;

use image::Rgba;
use palette::Srgba;
use serde::{Deserialize, Serialize};

use crate::error::{PaletError, Result};

/// An immutable 8-bit RGBA color.
///
/// Equality and hashing are by the exact four channels. Serialized as its hex
/// string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, u8::MAX)
    }

    /// Parse a hex literal with or without a leading `#`.
    ///
    /// The allowed forms are:
    /// * `#N` (gray shade, the nibble repeated across R, G and B)
    /// * `#RGB`
    /// * `#RGBA`
    /// * `#RRGGBB`
    /// * `#RRGGBBAA`
    ///
    /// Short forms duplicate each nibble. Missing alpha is fully opaque.
    pub fn from_hex(input: &str) -> Result<Self> {
        let digits = input.strip_prefix('#').unwrap_or(input);
        if digits.is_empty() {
            return Err(PaletError::format(input, "empty hex literal"));
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PaletError::format(input, "non-hex character"));
        }

        let nibbles: Vec<u8> = digits
            .bytes()
            .map(|b| match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                _ => b - b'A' + 10,
            })
            .collect();
        let short = |n: u8| n * 17;
        let long = |hi: u8, lo: u8| hi << 4 | lo;

        let color = match nibbles.as_slice() {
            &[n] => Self::rgb(short(n), short(n), short(n)),
            &[r, g, b] => Self::rgb(short(r), short(g), short(b)),
            &[r, g, b, a] => Self::new(short(r), short(g), short(b), short(a)),
            &[r1, r0, g1, g0, b1, b0] => Self::rgb(long(r1, r0), long(g1, g0), long(b1, b0)),
            &[r1, r0, g1, g0, b1, b0, a1, a0] => Self::new(
                long(r1, r0),
                long(g1, g0),
                long(b1, b0),
                long(a1, a0),
            ),
            _ => return Err(PaletError::format(input, "expected 1, 3, 4, 6 or 8 hex digits")),
        };
        Ok(color)
    }

    /// Build a color from raw integer channels, `[r, g, b]` or `[r, g, b, a]`.
    pub fn from_channels(channels: &[i64]) -> Result<Self> {
        let checked = |value: i64| {
            u8::try_from(value)
                .map_err(|_| PaletError::InvalidColor(format!("channel {value} outside 0..=255")))
        };

        match *channels {
            [r, g, b] => Ok(Self::rgb(checked(r)?, checked(g)?, checked(b)?)),
            [r, g, b, a] => Ok(Self::new(checked(r)?, checked(g)?, checked(b)?, checked(a)?)),
            _ => Err(PaletError::InvalidColor(format!(
                "expected 3 or 4 channels, got {}",
                channels.len()
            ))),
        }
    }

    pub const fn channels(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub const fn red(self) -> u8 {
        self.r
    }

    pub const fn green(self) -> u8 {
        self.g
    }

    pub const fn blue(self) -> u8 {
        self.b
    }

    pub const fn alpha(self) -> u8 {
        self.a
    }

    /// Lowercase hex string, 2 digits per channel. The alpha pair is omitted for
    /// opaque colors, so `#531380` stays `#531380`.
    pub fn hex(self) -> String {
        if self.a == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Channel-wise mean, truncated toward zero.
    pub fn average(self, other: Self) -> Self {
        let mean = |x: u8, y: u8| ((u16::from(x) + u16::from(y)) / 2) as u8;
        Self::new(
            mean(self.r, other.r),
            mean(self.g, other.g),
            mean(self.b, other.b),
            mean(self.a, other.a),
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Color {
    type Err = PaletError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = PaletError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.hex()
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<Color> for [u8; 4] {
    fn from(color: Color) -> Self {
        color.channels()
    }
}

impl From<Rgba<u8>> for Color {
    fn from(pixel: Rgba<u8>) -> Self {
        Self::from(pixel.0)
    }
}

impl From<Color> for Rgba<u8> {
    fn from(color: Color) -> Self {
        Rgba(color.channels())
    }
}

impl From<Srgba<u8>> for Color {
    fn from(c: Srgba<u8>) -> Self {
        Self::new(c.red, c.green, c.blue, c.alpha)
    }
}

impl From<Color> for Srgba<u8> {
    fn from(c: Color) -> Self {
        Srgba::new(c.r, c.g, c.b, c.a)
    }
}
