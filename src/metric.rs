//! Distance functions between two colors.

use crate::color::Color;

/// A pure, non-negative distance between two colors.
pub trait Metric {
    fn distance(&self, a: Color, b: Color) -> f64;
}

/// Euclidean distance over the 4-channel RGBA vector.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Metric for Euclidean {
    fn distance(&self, a: Color, b: Color) -> f64 {
        a.channels()
            .into_iter()
            .zip(b.channels())
            .map(|(x, y)| {
                let d = f64::from(x) - f64::from(y);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

impl<F> Metric for F
where
    F: Fn(Color, Color) -> f64,
{
    fn distance(&self, a: Color, b: Color) -> f64 {
        self(a, b)
    }
}
