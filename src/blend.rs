//! Derive palettes by averaging colors in a caller-supplied order.
//!
//! Averages are channel-wise and truncated (see [`Color::average`]).

use crate::color::Color;

/// Interleave each color with the average of it and its predecessor.
///
/// `[a, b, c]` becomes `[a, avg(a, b), b, avg(b, c), c]`, so `n` colors yield
/// `2n - 1` (or none for empty input).
pub fn maximize_by_average(colors: &[Color]) -> Vec<Color> {
    let Some((&first, rest)) = colors.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(colors.len() * 2 - 1);
    out.push(first);
    for &color in rest {
        // The last pushed entry is always the previous input color.
        let prev = out[out.len() - 1];
        out.push(prev.average(color));
        out.push(color);
    }
    out
}

/// The `n - 1` averages of the *last* color with each color after the first.
///
/// This pairs `colors[n - 1]` with `colors[i]` for `i >= 1` rather than with the
/// adjacent predecessor, and the final entry is therefore the last color itself.
pub fn minimize_by_average(colors: &[Color]) -> Vec<Color> {
    let Some(&last) = colors.last() else {
        return Vec::new();
    };

    colors[1..].iter().map(|&c| last.average(c)).collect()
}
