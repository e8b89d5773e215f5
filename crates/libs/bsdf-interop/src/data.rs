//! Canonical in-memory model of an angular scattering dataset.
//!
//! Both file grammars load into the same shapes: a [`BsdfDataset`] owning one
//! dense [`BsdfBlock`] per measurement slice plus a parallel [`TisTable`] of
//! total-integrated-scatter scalars. Blocks are stored azimuth-major, the
//! layout the Zemax grammar uses on disk; the Speos reader transposes its
//! radial-major rows on load.

use crate::{ScatterType, Symmetry};

/// Dense 2-D table of scattering intensities for one measurement slice.
///
/// The block owns its two angular axes in degrees, each strictly increasing:
/// `radial` is the polar (theta) axis, `azimuth` the phi axis. Values are laid
/// out azimuth-major, i.e. one contiguous run of radial samples per azimuth
/// sample.
#[derive(Debug, Clone, PartialEq)]
pub struct BsdfBlock {
    /// Polar angles of the outgoing directions, in degrees.
    pub radial: Vec<f64>,
    /// Azimuthal angles of the outgoing directions, in degrees.
    pub azimuth: Vec<f64>,
    values: Vec<f64>,
}

impl BsdfBlock {
    /// Creates a zero-filled block over the given axes.
    pub fn new(radial: Vec<f64>, azimuth: Vec<f64>) -> Self {
        let values = vec![0.0; radial.len() * azimuth.len()];
        Self {
            radial,
            azimuth,
            values,
        }
    }

    /// Creates a block from azimuth-major rows of radial samples.
    ///
    /// Each of the `azimuth.len()` rows must hold `radial.len()` values.
    pub fn from_rows(radial: Vec<f64>, azimuth: Vec<f64>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(rows.len(), azimuth.len());
        let mut block = Self::new(radial, azimuth);
        for (a, row) in rows.into_iter().enumerate() {
            debug_assert_eq!(row.len(), block.radial.len());
            for (r, value) in row.into_iter().enumerate() {
                block.set(a, r, value);
            }
        }
        block
    }

    /// Number of radial (theta) samples.
    pub fn n_radial(&self) -> usize { self.radial.len() }

    /// Number of azimuthal (phi) samples.
    pub fn n_azimuth(&self) -> usize { self.azimuth.len() }

    /// Intensity at the given azimuth and radial sample indices.
    #[inline]
    pub fn value(&self, azimuth_idx: usize, radial_idx: usize) -> f64 {
        self.values[azimuth_idx * self.radial.len() + radial_idx]
    }

    /// Overwrites the intensity at the given azimuth and radial indices.
    #[inline]
    pub fn set(&mut self, azimuth_idx: usize, radial_idx: usize, value: f64) {
        let n_radial = self.radial.len();
        self.values[azimuth_idx * n_radial + radial_idx] = value;
    }

    /// Raw azimuth-major sample storage.
    pub fn as_slice(&self) -> &[f64] { &self.values }

    /// Replaces the raw azimuth-major sample storage.
    ///
    /// The vector length must match the axis lengths.
    pub fn with_values(radial: Vec<f64>, azimuth: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), radial.len() * azimuth.len());
        Self {
            radial,
            azimuth,
            values,
        }
    }

    /// Multiplies every sample by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.values {
            *v *= factor;
        }
    }
}

/// Total-integrated-scatter scalars, one per measurement slice.
///
/// Indexed the same way as the dataset blocks: outer index is the
/// rotation-or-wavelength axis, inner index the incidence axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TisTable {
    n_inner: usize,
    values: Vec<f64>,
}

impl TisTable {
    /// Creates a zero-filled table of `n_outer * n_inner` entries.
    pub fn new(n_outer: usize, n_inner: usize) -> Self {
        Self {
            n_inner,
            values: vec![0.0; n_outer * n_inner],
        }
    }

    /// TIS value for the given slice.
    #[inline]
    pub fn get(&self, outer: usize, inner: usize) -> f64 { self.values[outer * self.n_inner + inner] }

    /// Overwrites the TIS value for the given slice.
    #[inline]
    pub fn set(&mut self, outer: usize, inner: usize, value: f64) {
        self.values[outer * self.n_inner + inner] = value;
    }
}

/// One complete angular scattering dataset of a single scatter type.
///
/// Blocks are ordered rotation-or-wavelength major, incidence minor. For
/// Zemax data the outer axis holds sample rotations; for Speos data it is
/// repurposed to hold the wavelength samples. A Speos file carrying both
/// reflection and transmission loads into two separate datasets.
#[derive(Debug, Clone)]
pub struct BsdfDataset {
    /// Reflection or transmission.
    pub scatter_type: ScatterType,
    /// Azimuthal symmetry of the measurement.
    pub symmetry: Symmetry,
    /// Sample-rotation angles in degrees, or wavelengths in nanometres for
    /// data loaded from a Speos file.
    pub rotations: Vec<f64>,
    /// Incidence angles in degrees.
    pub incidences: Vec<f64>,
    /// Dense blocks, `rotations.len() * incidences.len()` of them.
    pub blocks: Vec<BsdfBlock>,
    /// One TIS scalar per block, same ordering.
    pub tis: TisTable,
}

impl BsdfDataset {
    /// Number of entries on the rotation-or-wavelength axis.
    pub fn n_rotations(&self) -> usize { self.rotations.len() }

    /// Number of incidence angles.
    pub fn n_incidences(&self) -> usize { self.incidences.len() }

    /// Block for the given rotation-or-wavelength and incidence indices.
    pub fn block(&self, rotation_idx: usize, incidence_idx: usize) -> &BsdfBlock {
        &self.blocks[rotation_idx * self.incidences.len() + incidence_idx]
    }

    /// Mutable block for the given rotation-or-wavelength and incidence
    /// indices.
    pub fn block_mut(&mut self, rotation_idx: usize, incidence_idx: usize) -> &mut BsdfBlock {
        let n_incidences = self.incidences.len();
        &mut self.blocks[rotation_idx * n_incidences + incidence_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_layout_is_azimuth_major() {
        let block = BsdfBlock::from_rows(
            vec![0.0, 45.0, 90.0],
            vec![0.0, 180.0],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        );
        assert_eq!(block.n_radial(), 3);
        assert_eq!(block.n_azimuth(), 2);
        assert_eq!(block.value(0, 2), 3.0);
        assert_eq!(block.value(1, 0), 4.0);
        assert_eq!(block.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn block_scaling() {
        let mut block = BsdfBlock::from_rows(
            vec![0.0, 90.0],
            vec![0.0, 360.0],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        );
        block.scale(0.5);
        assert_eq!(block.value(1, 1), 2.0);
    }

    #[test]
    fn tis_table_indexing() {
        let mut tis = TisTable::new(2, 3);
        tis.set(1, 2, 0.25);
        assert_eq!(tis.get(1, 2), 0.25);
        assert_eq!(tis.get(0, 0), 0.0);
    }
}
