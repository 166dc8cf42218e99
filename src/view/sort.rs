//! Sort specification and cell ordering
//!
//! Ordering rules for a sort column:
//! - numbers compare numerically
//! - text that parses as a number sorts before other text, by value
//! - remaining text compares lexicographically
//! - numbers sort before text
//! - the missing sentinel sorts last in both directions (nulls last)
//!
//! Sorting is stable, so ties keep table order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::experiment::CellValue;

/// Sort direction for the active sort column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending order (smallest first)
    Ascending,
    /// Descending order (largest first)
    Descending,
}

impl SortOrder {
    /// Whether this is descending.
    #[must_use]
    pub const fn is_descending(self) -> bool {
        matches!(self, Self::Descending)
    }

    /// The opposite direction.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// The single active sort of a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    column: String,
    order: SortOrder,
}

impl SortSpec {
    /// Ascending sort on `column`.
    #[must_use]
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: SortOrder::Ascending,
        }
    }

    /// Sort column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Sort direction.
    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }

    /// Whether the sort is descending.
    #[must_use]
    pub const fn descending(&self) -> bool {
        self.order.is_descending()
    }

    pub(crate) fn flip(&mut self) {
        self.order = self.order.flipped();
    }
}

/// Compare two cells for display ordering.
///
/// The missing sentinel is placed after every present value regardless of
/// `order`; only present values are reversed for descending sorts.
#[must_use]
pub fn compare_cells(a: &CellValue, b: &CellValue, order: SortOrder) -> Ordering {
    match (a.is_missing(), b.is_missing()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    let cmp = compare_present(a, b);
    if order.is_descending() {
        cmp.reverse()
    } else {
        cmp
    }
}

fn compare_present(a: &CellValue, b: &CellValue) -> Ordering {
    match (a, b) {
        (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(y),
        (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
        (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
        // numeric-looking text first, by value; other text after, lexically
        (CellValue::Text(x), CellValue::Text(y)) => match (a.as_f64(), b.as_f64()) {
            (Some(nx), Some(ny)) => nx.total_cmp(&ny).then_with(|| x.cmp(y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => x.cmp(y),
        },
        _ => Ordering::Equal,
    }
}
