//! Mesh quantity and direction selectors for field/current retrieval.

use std::fmt;

/// Physical mesh quantity. Each maps to its own engine export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Electric field E.
    Electric,
    /// Magnetic field B.
    Magnetic,
    /// Current density J.
    CurrentDensity,
}

impl FieldKind {
    /// All mesh quantities.
    pub const ALL: [FieldKind; 3] = [Self::Electric, Self::Magnetic, Self::CurrentDensity];

    /// Single-letter physics symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Electric => "E",
            Self::Magnetic => "B",
            Self::CurrentDensity => "J",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Cartesian component of a vector mesh quantity.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// x component.
    X = 0,
    /// y component.
    Y = 1,
    /// z component.
    Z = 2,
}

impl Direction {
    /// All three components.
    pub const ALL: [Direction; 3] = [Self::X, Self::Y, Self::Z];

    /// Engine direction index.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: i32) -> Option<Self> {
        match index {
            0 => Some(Self::X),
            1 => Some(Self::Y),
            2 => Some(Self::Z),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("x"),
            Self::Y => f.write_str("y"),
            Self::Z => f.write_str("z"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_round_trips_through_index() {
        for d in Direction::ALL {
            assert_eq!(Direction::from_index(d.index()), Some(d));
        }
        assert_eq!(Direction::from_index(3), None);
    }

    #[test]
    fn field_kind_display() {
        assert_eq!(FieldKind::Electric.to_string(), "E");
        assert_eq!(FieldKind::CurrentDensity.to_string(), "J");
    }
}
