//! Conversion maps: assign every color of a source palette to one color of a
//! target palette.

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{PaletError, Result};
use crate::metric::{Euclidean, Metric};
use crate::palette::Palette;

/// Which candidate distance wins when building a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// Smallest distance.
    #[default]
    Nearest,
    /// Largest distance.
    Farthest,
}

impl Selection {
    /// Strict comparison, so the first candidate reaching the best distance is
    /// kept on ties.
    #[inline(always)]
    fn is_better(self, candidate: f64, best: f64) -> bool {
        match self {
            Selection::Nearest => candidate < best,
            Selection::Farthest => candidate > best,
        }
    }
}

/// Read-only mapping from source colors to target colors. Many-to-one is
/// allowed; every source color has exactly one entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<Color, Color>", from = "BTreeMap<Color, Color>")]
pub struct ConversionMap {
    map: HashMap<Color, Color>,
}

impl ConversionMap {
    /// Nearest-color map under Euclidean RGBA distance.
    pub fn nearest(source: &Palette, target: &Palette) -> Result<Self> {
        Self::build(source, target, &Euclidean, Selection::Nearest)
    }

    /// Map every source color to the target color selected by `selection` over
    /// `metric`. Targets are enumerated in [`Palette::to_list`] order.
    pub fn build<M: Metric + ?Sized>(
        source: &Palette,
        target: &Palette,
        metric: &M,
        selection: Selection,
    ) -> Result<Self> {
        Self::build_ordered(source.iter(), &target.to_list(), metric, selection)
    }

    /// Like [`ConversionMap::build`] but with an explicit target order; ties go
    /// to the earliest target in `target`.
    pub fn build_ordered<I, M>(
        source: I,
        target: &[Color],
        metric: &M,
        selection: Selection,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = Color>,
        M: Metric + ?Sized,
    {
        let (first, rest) = target.split_first().ok_or(PaletError::EmptyTarget)?;

        let map = source
            .into_iter()
            .map(|ca| {
                let mut best = *first;
                let mut best_dist = metric.distance(ca, *first);
                for &cb in rest {
                    let dist = metric.distance(ca, cb);
                    if selection.is_better(dist, best_dist) {
                        best = cb;
                        best_dist = dist;
                    }
                }
                (ca, best)
            })
            .collect();

        Ok(Self { map })
    }

    /// Assign each source color a uniformly random target color.
    ///
    /// Sources and targets are both enumerated in [`Palette::to_list`] order, so
    /// a fixed seed reproduces the same map.
    pub fn random(source: &Palette, target: &Palette, seed: Option<u64>) -> Result<Self> {
        Self::random_ordered(&source.to_list(), &target.to_list(), seed)
    }

    pub fn random_ordered(source: &[Color], target: &[Color], seed: Option<u64>) -> Result<Self> {
        if target.is_empty() {
            return Err(PaletError::EmptyTarget);
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let map = source
            .iter()
            .map(|&ca| (ca, target[rng.random_range(0..target.len())]))
            .collect();

        Ok(Self { map })
    }

    /// Wrap a precomputed mapping.
    pub fn from_pairs<I, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, C)>,
        C: Into<Color>,
    {
        Self {
            map: pairs
                .into_iter()
                .map(|(from, to)| (from.into(), to.into()))
                .collect(),
        }
    }

    pub fn get(&self, color: impl Into<Color>) -> Result<Color> {
        let color = color.into();
        self.map
            .get(&color)
            .copied()
            .ok_or(PaletError::NotFound(color))
    }

    /// The mapped color, or `color` itself when it is not a key.
    pub fn translate(&self, color: Color) -> Color {
        self.map.get(&color).copied().unwrap_or(color)
    }

    pub fn contains(&self, color: impl Into<Color>) -> bool {
        self.map.contains_key(&color.into())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Color, Color)> + '_ {
        self.map.iter().map(|(k, v)| (*k, *v))
    }

    /// The set of source colors.
    pub fn sources(&self) -> Palette {
        self.map.keys().copied().collect()
    }

    /// Raw channel mapping for pixel remapping.
    pub fn to_channel_map(&self) -> HashMap<[u8; 4], [u8; 4]> {
        self.map
            .iter()
            .map(|(k, v)| (k.channels(), v.channels()))
            .collect()
    }
}

impl From<ConversionMap> for BTreeMap<Color, Color> {
    fn from(cmap: ConversionMap) -> Self {
        cmap.map.into_iter().collect()
    }
}

impl From<BTreeMap<Color, Color>> for ConversionMap {
    fn from(map: BTreeMap<Color, Color>) -> Self {
        Self {
            map: map.into_iter().collect(),
        }
    }
}
