//! Strongly-typed indices passed to the engine.
//!
//! Both wrap the engine's native `int` so they can be forwarded without
//! conversion. Negative values are representable on purpose: in
//! pass-through mode the binding forwards whatever the caller supplies.

use std::fmt;

/// An AMR refinement level. Level 0 is the coarsest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(pub i32);

impl Level {
    /// The coarsest level.
    pub const BASE: Level = Level(0);
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Level {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Identifies a particle species by its registration order in the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesId(pub i32);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SpeciesId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
