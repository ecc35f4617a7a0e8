//! Native particle record layout and per-particle component selectors.

use std::fmt;
use std::mem::{align_of, offset_of, size_of};

/// One particle as the engine stores it in a tile's struct-of-records buffer.
///
/// The layout must match the engine's native struct byte for byte:
/// three `f64` positions followed by two `i32` tags, 32 bytes total.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleRecord {
    /// Position along x.
    pub x: f64,
    /// Position along y.
    pub y: f64,
    /// Position along z.
    pub z: f64,
    /// Particle id, unique within the owning process.
    pub id: i32,
    /// Rank of the process that created the particle.
    pub cpu: i32,
}

const _: () = assert!(size_of::<ParticleRecord>() == 32);
const _: () = assert!(align_of::<ParticleRecord>() == 8);
const _: () = assert!(offset_of!(ParticleRecord, x) == 0);
const _: () = assert!(offset_of!(ParticleRecord, y) == 8);
const _: () = assert!(offset_of!(ParticleRecord, z) == 16);
const _: () = assert!(offset_of!(ParticleRecord, id) == 24);
const _: () = assert!(offset_of!(ParticleRecord, cpu) == 28);

/// Selects one of the per-particle scalar arrays the engine keeps beside
/// the record buffer.
///
/// The discriminant is the component index understood by the engine's
/// `warpx_getParticleArrays` export.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParticleComponent {
    /// Macro-particle weight.
    Weight = 0,
    /// Momentum, x.
    Ux = 1,
    /// Momentum, y.
    Uy = 2,
    /// Momentum, z.
    Uz = 3,
    /// Electric field gathered at the particle, x.
    Ex = 4,
    /// Electric field gathered at the particle, y.
    Ey = 5,
    /// Electric field gathered at the particle, z.
    Ez = 6,
    /// Magnetic field gathered at the particle, x.
    Bx = 7,
    /// Magnetic field gathered at the particle, y.
    By = 8,
    /// Magnetic field gathered at the particle, z.
    Bz = 9,
}

impl ParticleComponent {
    /// Every component, in engine index order.
    pub const ALL: [ParticleComponent; 10] = [
        Self::Weight,
        Self::Ux,
        Self::Uy,
        Self::Uz,
        Self::Ex,
        Self::Ey,
        Self::Ez,
        Self::Bx,
        Self::By,
        Self::Bz,
    ];

    /// Engine component index.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Inverse of [`index`](Self::index).
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Short lowercase name, as used by the accessor methods.
    pub fn name(self) -> &'static str {
        match self {
            Self::Weight => "weight",
            Self::Ux => "ux",
            Self::Uy => "uy",
            Self::Uz => "uz",
            Self::Ex => "ex",
            Self::Ey => "ey",
            Self::Ez => "ez",
            Self::Bx => "bx",
            Self::By => "by",
            Self::Bz => "bz",
        }
    }
}

impl fmt::Display for ParticleComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
