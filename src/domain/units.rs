//! Conversion of flat minor-unit quantities into major/minor display units.

use serde::Serialize;

/// Quantity expressed as whole major units plus the minor-unit remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnitSplit {
    pub major: i32,
    pub minor: i32,
}

/// Display form of a quantity for a product with the given split ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "display", rename_all = "snake_case")]
pub enum DisplayQuantity {
    /// The product has no major unit; only minor units are shown.
    MinorOnly { minor: i32 },
    /// Major units plus remainder.
    Split { major: i32, minor: i32 },
}

/// Split `quantity` minor units into `(major, minor)` using floor division.
///
/// Ratios below 1 are treated as 1. Negative quantities are the caller's
/// responsibility to reject; floor semantics still keep `0 <= minor < ratio`.
pub fn split(quantity: i32, ratio: i32) -> UnitSplit {
    let ratio = ratio.max(1);
    UnitSplit {
        major: quantity.div_euclid(ratio),
        minor: quantity.rem_euclid(ratio),
    }
}

/// Render `quantity` for display. A ratio of 1 or less (or unset) has no
/// meaningful major unit, so the major part is omitted.
pub fn display(quantity: i32, ratio: Option<i32>) -> DisplayQuantity {
    match ratio {
        Some(ratio) if ratio > 1 => {
            let UnitSplit { major, minor } = split(quantity, ratio);
            DisplayQuantity::Split { major, minor }
        }
        _ => DisplayQuantity::MinorOnly { minor: quantity },
    }
}
