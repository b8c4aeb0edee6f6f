//! Palette: a deduplicated set of colors with set algebra.

use std::collections::{BTreeMap, HashSet};
use std::ops::{BitAnd, BitOr, Sub};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Color;
use crate::error::{PaletError, Result};

/// An unordered, duplicate-free collection of colors.
///
/// Mutators work in place; set operations return a new palette and never alias
/// their operands.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(into = "Vec<Color>", from = "Vec<Color>")]
pub struct Palette {
    colors: HashSet<Color>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette from hex literals, failing on the first malformed one.
    pub fn from_hex<I, S>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        literals
            .into_iter()
            .map(|s| Color::from_hex(s.as_ref()))
            .collect()
    }

    /// Build a palette from a loosely typed JSON value.
    ///
    /// Accepts an array whose items are hex strings or channel arrays, or an
    /// object keyed by hex strings (the shape produced by [`Palette::to_index`]).
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.iter().map(color_from_value).collect(),
            Value::Object(entries) => entries.keys().map(|k| Color::from_hex(k)).collect(),
            other => Err(PaletError::TypeKind {
                expected: "palette (array or object)",
                found: value_kind(other),
            }),
        }
    }

    /// Insert a color. Returns `false` if it was already present.
    pub fn add(&mut self, color: impl Into<Color>) -> bool {
        self.colors.insert(color.into())
    }

    /// Insert a color given as raw `[r, g, b]` or `[r, g, b, a]` channels.
    pub fn add_channels(&mut self, channels: &[i64]) -> Result<bool> {
        Ok(self.add(Color::from_channels(channels)?))
    }

    pub fn remove(&mut self, color: impl Into<Color>) -> Result<()> {
        let color = color.into();
        if self.colors.remove(&color) {
            Ok(())
        } else {
            Err(PaletError::NotFound(color))
        }
    }

    pub fn remove_channels(&mut self, channels: &[i64]) -> Result<()> {
        self.remove(Color::from_channels(channels)?)
    }

    pub fn clear(&mut self) {
        self.colors.clear();
    }

    pub fn contains(&self, color: impl Into<Color>) -> bool {
        self.colors.contains(&color.into())
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Iterate in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().copied()
    }

    pub fn colors(&self) -> &HashSet<Color> {
        &self.colors
    }

    /// The same set projected to raw channel arrays.
    pub fn channel_set(&self) -> HashSet<[u8; 4]> {
        self.colors.iter().map(|c| c.channels()).collect()
    }

    pub fn union(&self, other: &Palette) -> Palette {
        self.colors.union(&other.colors).copied().collect()
    }

    pub fn intersection(&self, other: &Palette) -> Palette {
        self.colors.intersection(&other.colors).copied().collect()
    }

    pub fn difference(&self, other: &Palette) -> Palette {
        self.colors.difference(&other.colors).copied().collect()
    }

    /// Members sorted by channels, giving a stable order for callers that need
    /// to enumerate a palette deterministically.
    pub fn to_list(&self) -> Vec<Color> {
        let mut list: Vec<Color> = self.colors.iter().copied().collect();
        list.sort_unstable();
        list
    }

    /// Map each member's hex string to its channels.
    pub fn to_index(&self) -> BTreeMap<String, [u8; 4]> {
        self.colors.iter().map(|c| (c.hex(), c.channels())).collect()
    }
}

fn color_from_value(value: &Value) -> Result<Color> {
    match value {
        Value::String(s) => Color::from_hex(s),
        Value::Array(items) => {
            let channels = items
                .iter()
                .map(|v| {
                    v.as_i64().ok_or_else(|| {
                        PaletError::InvalidColor(format!("channel {v} is not an integer"))
                    })
                })
                .collect::<Result<Vec<i64>>>()?;
            Color::from_channels(&channels)
        }
        other => Err(PaletError::InvalidColor(format!(
            "expected hex string or channel array, found {}",
            value_kind(other)
        ))),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        self.colors == other.colors
    }
}

impl Eq for Palette {}

impl PartialEq<HashSet<Color>> for Palette {
    fn eq(&self, other: &HashSet<Color>) -> bool {
        &self.colors == other
    }
}

impl PartialEq<HashSet<[u8; 4]>> for Palette {
    fn eq(&self, other: &HashSet<[u8; 4]>) -> bool {
        self.colors.len() == other.len()
            && other.iter().all(|c| self.colors.contains(&Color::from(*c)))
    }
}

impl<C: Into<Color>> FromIterator<C> for Palette {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            colors: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<C: Into<Color>> Extend<C> for Palette {
    fn extend<I: IntoIterator<Item = C>>(&mut self, iter: I) {
        self.colors.extend(iter.into_iter().map(Into::into));
    }
}

impl From<Vec<Color>> for Palette {
    fn from(colors: Vec<Color>) -> Self {
        colors.into_iter().collect()
    }
}

impl From<Palette> for Vec<Color> {
    fn from(palette: Palette) -> Self {
        palette.to_list()
    }
}

impl IntoIterator for Palette {
    type Item = Color;
    type IntoIter = std::collections::hash_set::IntoIter<Color>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.into_iter()
    }
}

impl<'a> IntoIterator for &'a Palette {
    type Item = Color;
    type IntoIter = std::iter::Copied<std::collections::hash_set::Iter<'a, Color>>;

    fn into_iter(self) -> Self::IntoIter {
        self.colors.iter().copied()
    }
}

impl BitOr for &Palette {
    type Output = Palette;

    fn bitor(self, rhs: Self) -> Palette {
        self.union(rhs)
    }
}

impl BitAnd for &Palette {
    type Output = Palette;

    fn bitand(self, rhs: Self) -> Palette {
        self.intersection(rhs)
    }
}

impl Sub for &Palette {
    type Output = Palette;

    fn sub(self, rhs: Self) -> Palette {
        self.difference(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Palette {
        Palette::from_hex(["#531380", "#d7820e", "#60d048", "#f8c630"]).unwrap()
    }

    fn hex(s: &str) -> Color {
        Color::from_hex(s).unwrap()
    }

    #[test]
    fn equality_ignores_insertion_order() {
        assert_eq!(Palette::new(), Palette::new());
        assert_eq!(
            Palette::from_iter([hex("fff"), hex("000")]),
            Palette::from_iter([hex("000"), hex("fff")])
        );
        assert_ne!(sample(), Palette::new());
    }

    #[test]
    fn equality_against_raw_sets() {
        let palette = sample();
        assert_eq!(palette, palette.colors().clone());
        assert_eq!(palette, palette.channel_set());

        let mut raw = palette.channel_set();
        raw.insert([255, 255, 255, 0]);
        assert_ne!(palette, raw);
    }

    #[test]
    fn channel_set_projects_members() {
        let set = sample().channel_set();
        assert_eq!(set.len(), 4);
        assert!(set.contains(&[83, 19, 128, 255]));
        assert!(set.contains(&[215, 130, 14, 255]));
        assert!(set.contains(&[96, 208, 72, 255]));
        assert!(set.contains(&[248, 198, 48, 255]));
    }

    #[test]
    fn add_is_idempotent_and_accepts_raw_input() {
        let mut palette = sample();
        assert!(palette.add(hex("fff")));
        assert!(!palette.add(hex("fff")));
        assert!(palette.contains(hex("fff")));

        palette.add((0, 0, 0, 255));
        assert!(palette.contains([0, 0, 0, 255]));
        assert_eq!(palette.len(), 6);

        assert!(matches!(palette.add_channels(&[1]), Err(PaletError::InvalidColor(_))));
        assert!(palette.add_channels(&[1, 2, 3]).unwrap());
        assert!(palette.contains((1, 2, 3, 255)));
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut palette = sample();
        palette.remove(hex("531380")).unwrap();
        assert!(!palette.contains(hex("531380")));

        let err = palette.remove((83, 19, 128, 255)).unwrap_err();
        assert!(matches!(err, PaletError::NotFound(c) if c == hex("531380")));

        palette.remove_channels(&[215, 130, 14, 255]).unwrap();
        assert!(!palette.contains([215, 130, 14, 255]));
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn clear_empties() {
        let mut palette = sample();
        palette.clear();
        assert!(palette.is_empty());
        assert!(palette.channel_set().is_empty());
    }

    #[test]
    fn contains_checks_exact_channels() {
        let palette = sample();
        assert!(palette.contains(hex("f8c630")));
        assert!(!palette.contains(hex("fff")));
        assert!(palette.contains((96, 208, 72, 255)));
        assert!(!palette.contains((96, 208, 72, 0)));
    }

    #[test]
    fn set_algebra_laws() {
        let p = sample();
        let empty = Palette::new();

        assert_eq!(&p | &p, p);
        assert_eq!(&p & &p, p);
        assert_eq!(&p - &p, empty);
        assert_eq!(&p | &empty, p);
        assert_eq!(&p & &empty, empty);
    }

    #[test]
    fn union_and_intersection_commute() {
        let p = sample();
        let mp = Palette::from_iter([hex("531380")]);
        let np = Palette::from_iter([hex("FFF")]);

        assert_eq!(p.union(&mp), p);
        assert_eq!(p.union(&np), np.union(&p));
        assert_ne!(p.union(&np), p);
        assert_eq!(p.intersection(&mp), mp.intersection(&p));
        assert_eq!(p.intersection(&mp), mp);
        assert_eq!(p.intersection(&np), Palette::new());
    }

    #[test]
    fn difference_is_not_commutative() {
        let p = sample();
        let mp = Palette::from_iter([hex("531380")]);
        let np = Palette::from_iter([hex("FFF")]);

        assert_eq!(
            p.difference(&mp),
            Palette::from_hex(["#d7820e", "#60d048", "#f8c630"]).unwrap()
        );
        assert_eq!(p.difference(&np), p);
        assert_ne!(p.difference(&np), np.difference(&p));
        assert_eq!(p.difference(&Palette::new()), p);
    }

    #[test]
    fn set_operations_leave_operands_untouched() {
        let p = sample();
        let np = Palette::from_iter([hex("FFF")]);
        let _ = p.union(&np);
        assert_eq!(p.len(), 4);
        assert_eq!(np.len(), 1);
    }

    #[test]
    fn to_list_is_sorted_and_complete() {
        let list = sample().to_list();
        assert_eq!(list.len(), 4);
        assert!(list.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(Palette::from(list.clone()), sample());
    }

    #[test]
    fn to_index_maps_hex_to_channels() {
        let index = sample().to_index();
        assert_eq!(index.len(), 4);
        assert_eq!(index.get("#531380"), Some(&[83, 19, 128, 255]));
        assert!(index.contains_key("#d7820e"));
    }

    #[test]
    fn from_value_accepts_lists_and_indexes() {
        let list = json!(["#531380", [215, 130, 14], [96, 208, 72, 255], "f8c630"]);
        assert_eq!(Palette::from_value(&list).unwrap(), sample());

        let index = serde_json::to_value(sample().to_index()).unwrap();
        assert_eq!(Palette::from_value(&index).unwrap(), sample());
    }

    #[test]
    fn from_value_rejects_non_palettes() {
        for value in [json!(null), json!(12), json!("#fff"), json!(true)] {
            assert!(matches!(
                Palette::from_value(&value),
                Err(PaletError::TypeKind { .. })
            ));
        }
        assert!(matches!(
            Palette::from_value(&json!([0])),
            Err(PaletError::InvalidColor(_))
        ));
        assert!(matches!(
            Palette::from_value(&json!([[0, 1, 2, 3, 4, 5, 6, 7, 8]])),
            Err(PaletError::InvalidColor(_))
        ));
        assert!(matches!(
            Palette::from_value(&json!(["#xyz"])),
            Err(PaletError::Format { .. })
        ));
    }

    #[test]
    fn serde_round_trip_uses_sorted_hex_list() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json, json!(["#531380", "#60d048", "#d7820e", "#f8c630"]));
        let back: Palette = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }
}
