//! Cell values - the scalars stored in a run table

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Display token for the missing sentinel.
///
/// Sources normalize every absent value to [`CellValue::Missing`] before a
/// table reaches the view layer, so filters can target it like any value.
pub const MISSING_VALUE: &str = "N/A";

/// A single cell of a run table.
///
/// Numbers compare by value (`-0.0 == 0.0`); `NaN` never enters a table
/// because [`CellValue::number`] maps it to [`CellValue::Missing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric value (metrics, numeric params)
    Number(f64),
    /// Free text (params, tags, status, ids)
    Text(String),
    /// The missing sentinel
    Missing,
}

impl CellValue {
    /// Build a numeric cell, normalizing `NaN` to the missing sentinel.
    #[must_use]
    pub fn number(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing
        } else {
            Self::Number(value)
        }
    }

    /// Build a text cell.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Whether this is the missing sentinel.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the cell: numbers as-is, text if it parses.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| !n.is_nan()),
            Self::Missing => None,
        }
    }

    // -0.0 and 0.0 must hash and compare alike
    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0_f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Self::number_bits(*a) == Self::number_bits(*b),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Missing, Self::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Number(n) => Self::number_bits(*n).hash(state),
            Self::Text(s) => s.hash(state),
            Self::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str(MISSING_VALUE),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_nan_becomes_missing() {
        assert_eq!(CellValue::number(f64::NAN), CellValue::Missing);
        assert_eq!(CellValue::from(None::<f64>), CellValue::Missing);
    }

    #[test]
    fn test_signed_zero_is_one_value() {
        let mut set = FxHashSet::default();
        set.insert(CellValue::Number(0.0));
        assert!(set.contains(&CellValue::Number(-0.0)));
    }

    #[test]
    fn test_number_and_text_are_distinct() {
        assert_ne!(CellValue::Number(1.0), CellValue::text("1"));
        assert_eq!(CellValue::text("1").as_f64(), Some(1.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Missing.to_string(), "N/A");
        assert_eq!(CellValue::Number(0.25).to_string(), "0.25");
        assert_eq!(CellValue::text("FAILED").to_string(), "FAILED");
    }

    #[test]
    fn test_json_null_is_missing() {
        let cells: Vec<CellValue> = serde_json::from_str(r#"[1.5, "a", null]"#).unwrap();
        assert_eq!(
            cells,
            vec![CellValue::Number(1.5), CellValue::text("a"), CellValue::Missing]
        );
    }
}
