//! Per-tile particle views.
//!
//! A tile is one engine-internal spatial subdivision with its own
//! contiguous particle buffers: a record buffer ([`ParticleTile`]) and one
//! `f64` buffer per scalar component ([`ScalarTile`]). Named position and
//! tag columns ([`ParticleColumn`]) are strided projections of the record
//! buffer and share its memory.

use std::cell::Cell;
use std::fmt;
use std::mem::{offset_of, size_of};

use ndarray::ArrayView1;
use warpx_core::{ParticleComponent, ParticleRecord};

use crate::raw;

/// Writable view of one tile's scalar component buffer.
#[derive(Clone, Copy, Debug)]
pub struct ScalarTile<'a> {
    data: &'a [Cell<f64>],
    component: ParticleComponent,
}

impl<'a> ScalarTile<'a> {
    /// Wrap `len` engine values of `component` starting at `ptr`.
    ///
    /// # Safety
    ///
    /// Unless `len == 0`, `ptr` must point to `len` initialized `f64` that
    /// stay allocated and are not moved for `'a`, and that nothing but
    /// `Cell`-based views touches during `'a`.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(ptr: *mut f64, len: usize, component: ParticleComponent) -> Self {
        Self {
            // SAFETY: forwarded contract.
            data: unsafe { raw::cells(ptr, len) },
            component,
        }
    }

    /// Component this buffer holds.
    pub fn component(&self) -> ParticleComponent {
        self.component
    }

    /// Number of particles in the tile.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tile holds no particles.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value for particle `i`.
    pub fn get(&self, i: usize) -> Option<f64> {
        self.data.get(i).map(Cell::get)
    }

    /// Overwrite particle `i`.
    ///
    /// # Panics
    ///
    /// If `i >= len()`.
    pub fn set(&self, i: usize, value: f64) {
        self.data[i].set(value);
    }

    /// Overwrite every particle.
    pub fn fill(&self, value: f64) {
        self.data.iter().for_each(|c| c.set(value));
    }

    /// Current values, in tile order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + 'a {
        let data = self.data;
        data.iter().map(Cell::get)
    }

    /// Copy the current values out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }

    /// The underlying cells.
    pub fn as_cells(&self) -> &'a [Cell<f64>] {
        self.data
    }

    /// Address of the first element, for handing the buffer to another
    /// foreign consumer.
    pub fn as_ptr(&self) -> *mut f64 {
        self.data.as_ptr().cast::<f64>().cast_mut()
    }
}

/// Writable view of one tile's particle records.
#[derive(Clone, Copy, Debug)]
pub struct ParticleTile<'a> {
    records: &'a [Cell<ParticleRecord>],
}

impl<'a> ParticleTile<'a> {
    /// Wrap `len` engine records starting at `ptr`.
    ///
    /// # Safety
    ///
    /// As [`ScalarTile::from_raw`], for `len` records.
    #[allow(unsafe_code)]
    pub unsafe fn from_raw(ptr: *mut ParticleRecord, len: usize) -> Self {
        Self {
            // SAFETY: forwarded contract.
            records: unsafe { raw::cells(ptr, len) },
        }
    }

    /// Number of particles in the tile.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the tile holds no particles.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record for particle `i`.
    pub fn get(&self, i: usize) -> Option<ParticleRecord> {
        self.records.get(i).map(Cell::get)
    }

    /// Overwrite particle `i`.
    ///
    /// # Panics
    ///
    /// If `i >= len()`.
    pub fn set(&self, i: usize, record: ParticleRecord) {
        self.records[i].set(record);
    }

    /// Current records, in tile order.
    pub fn iter(&self) -> impl Iterator<Item = ParticleRecord> + 'a {
        let records = self.records;
        records.iter().map(Cell::get)
    }

    /// Copy the current records out.
    pub fn to_vec(&self) -> Vec<ParticleRecord> {
        self.iter().collect()
    }

    /// Address of the first record.
    pub fn as_ptr(&self) -> *mut ParticleRecord {
        self.records.as_ptr().cast::<ParticleRecord>().cast_mut()
    }

    /// Position x of every particle.
    pub fn x(&self) -> ParticleColumn<'a, f64> {
        self.column(offset_of!(ParticleRecord, x))
    }

    /// Position y of every particle.
    pub fn y(&self) -> ParticleColumn<'a, f64> {
        self.column(offset_of!(ParticleRecord, y))
    }

    /// Position z of every particle.
    pub fn z(&self) -> ParticleColumn<'a, f64> {
        self.column(offset_of!(ParticleRecord, z))
    }

    /// Particle id of every particle.
    pub fn id(&self) -> ParticleColumn<'a, i32> {
        self.column(offset_of!(ParticleRecord, id))
    }

    /// Owning process of every particle.
    pub fn cpu(&self) -> ParticleColumn<'a, i32> {
        self.column(offset_of!(ParticleRecord, cpu))
    }

    /// Project the field at byte `offset` of every record.
    #[allow(unsafe_code)]
    fn column<T: Copy>(&self, offset: usize) -> ParticleColumn<'a, T> {
        debug_assert_eq!(size_of::<ParticleRecord>() % size_of::<T>(), 0);
        debug_assert_eq!(offset % size_of::<T>(), 0);
        let stride = size_of::<ParticleRecord>() / size_of::<T>();
        let base = self
            .records
            .as_ptr()
            .cast::<u8>()
            .wrapping_add(offset)
            .cast::<T>()
            .cast_mut();
        ParticleColumn {
            // SAFETY: `base + i * stride` addresses the chosen field of
            // record `i`, which lies inside `self.records` and is therefore
            // valid for `'a` under the same Cell-only access rule.
            data: unsafe { raw::strided(base, self.records.len(), stride) },
        }
    }
}

/// One named field projected out of a [`ParticleTile`], without copying.
#[derive(Clone)]
pub struct ParticleColumn<'a, T> {
    data: ArrayView1<'a, Cell<T>>,
}

impl<T: Copy + fmt::Debug> fmt::Debug for ParticleColumn<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T: Copy> ParticleColumn<'a, T> {
    /// Number of particles.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the column is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value for particle `i`.
    pub fn get(&self, i: usize) -> Option<T> {
        self.data.get(i).map(Cell::get)
    }

    /// Overwrite particle `i`.
    ///
    /// # Panics
    ///
    /// If `i >= len()`.
    pub fn set(&self, i: usize, value: T) {
        self.data[i].set(value);
    }

    /// Overwrite every particle.
    pub fn fill(&self, value: T) {
        self.data.iter().for_each(|c| c.set(value));
    }

    /// Current values, in tile order.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.data.iter().map(Cell::get)
    }

    /// Copy the current values out.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    /// The strided ndarray view over the record buffer.
    pub fn as_array(&self) -> &ArrayView1<'a, Cell<T>> {
        &self.data
    }
}
