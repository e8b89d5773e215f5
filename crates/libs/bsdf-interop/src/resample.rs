//! Resampling of an irregular source grid onto a uniform target grid.
//!
//! Every target cell is mapped back into source coordinates through the
//! frame transform and filled by bilinear interpolation from the four
//! bracketing source samples. Cells are independent of each other, so the
//! dominant 4-nested loop of a conversion is expressed as a parallel map
//! over cells.

use crate::{
    data::{BsdfBlock, BsdfDataset, TisTable},
    frame::{self, FrameDirection},
    Symmetry,
};
use rayon::prelude::*;

/// Maximum number of samples per target axis when deriving a resolution
/// from the source axis cardinalities.
const MAX_AXIS_SAMPLES: usize = 1000;

/// Target resolutions are rounded to the nearest multiple of half a degree.
const RESOLUTION_MULTIPLE: f64 = 0.5;

/// Uniform angular step sizes of the target grid, in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridResolution {
    /// Step of the polar axis; the axis runs from 0 to 90 degrees inclusive.
    pub theta_step: f64,
    /// Step of the azimuthal axis; the axis runs from 0 to 360 degrees
    /// inclusive.
    pub phi_step: f64,
}

impl GridResolution {
    /// Number of samples on the target polar axis.
    pub fn n_theta(&self) -> usize { (90.0 / self.theta_step) as usize + 1 }

    /// Number of samples on the target azimuthal axis.
    pub fn n_phi(&self) -> usize { (360.0 / self.phi_step) as usize + 1 }

    /// Target polar axis `{0, step, 2*step, ..., 90}` in degrees.
    pub fn theta_axis(&self) -> Vec<f64> {
        (0..self.n_theta()).map(|k| k as f64 * self.theta_step).collect()
    }

    /// Target azimuthal axis `{0, step, 2*step, ..., 360}` in degrees.
    pub fn phi_axis(&self) -> Vec<f64> {
        (0..self.n_phi()).map(|k| k as f64 * self.phi_step).collect()
    }
}

/// Derives the recommended target resolution from the source axis
/// cardinalities.
///
/// Each step is the source axis' average spacing over its domain, capped at
/// [`MAX_AXIS_SAMPLES`] samples, rounded to one decimal and then to the
/// nearest half-degree multiple. Plane-symmetric data only covers half of
/// the azimuth domain, which halves the cap as well.
pub fn recommended_resolution(radial: &[f64], azimuth: &[f64], symmetry: Symmetry) -> GridResolution {
    let (phi_domain, phi_cap) = if symmetry.folds_azimuth() {
        (180.0, MAX_AXIS_SAMPLES / 2)
    } else {
        (360.0, MAX_AXIS_SAMPLES)
    };
    GridResolution {
        theta_step: axis_step(radial.len(), 90.0, MAX_AXIS_SAMPLES),
        phi_step: axis_step(azimuth.len(), phi_domain, phi_cap),
    }
}

fn axis_step(len: usize, domain: f64, cap: usize) -> f64 {
    let intervals = if len > cap { cap - 1 } else { len.max(2) - 1 };
    let rounded = (domain / intervals as f64 * 10.0).round() / 10.0;
    let step = RESOLUTION_MULTIPLE * (rounded / RESOLUTION_MULTIPLE).round();
    // A dense source axis can round all the way down to zero; floor the step
    // at the rounding multiple so the target axis stays finite.
    if step > 0.0 {
        step
    } else {
        RESOLUTION_MULTIPLE
    }
}

/// Two source samples bracketing a target coordinate on one axis, plus the
/// linear weight of the upper sample.
///
/// At either edge of the axis both indices collapse to the edge sample and
/// the weight drops to zero, i.e. the lookup extrapolates flat.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisBracket {
    /// Index of the lower bracketing sample.
    pub lower: usize,
    /// Index of the upper bracketing sample.
    pub upper: usize,
    /// Fractional position between the two samples, in `[0, 1]`.
    pub weight: f64,
}

/// Locates the bracketing samples of `x` on a strictly increasing axis.
pub fn bracket(axis: &[f64], x: f64) -> AxisBracket {
    let idx = axis.partition_point(|v| *v < x);
    if idx == 0 {
        AxisBracket {
            lower: 0,
            upper: 0,
            weight: 0.0,
        }
    } else if idx <= axis.len() - 1 {
        let lower = idx - 1;
        AxisBracket {
            lower,
            upper: idx,
            weight: (x - axis[lower]) / (axis[idx] - axis[lower]),
        }
    } else {
        let last = axis.len() - 1;
        AxisBracket {
            lower: last,
            upper: last,
            weight: 0.0,
        }
    }
}

/// Reference to one target grid cell of a resampling job.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridCell {
    /// Target polar angle in degrees.
    pub theta: f64,
    /// Target azimuthal angle in degrees.
    pub phi: f64,
}

/// Computes the value of a single target cell.
///
/// The target angles are re-expressed in the source frame; a polar angle
/// outside `[0, 90]` is physically unreachable and yields zero. Otherwise
/// the azimuth is folded for plane-symmetric data and the four bracketing
/// source samples are blended bilinearly, theta first, then phi.
pub fn resample_cell(
    block: &BsdfBlock,
    cell: GridCell,
    incidence: f64,
    direction: FrameDirection,
    symmetry: Symmetry,
) -> f64 {
    let (theta, phi) = frame::transform(cell.theta, cell.phi, incidence, direction);
    if !(0.0..=90.0).contains(&theta) {
        return 0.0;
    }
    let phi = if symmetry.folds_azimuth() && phi > 180.0 {
        360.0 - phi
    } else {
        phi
    };
    let t = bracket(&block.radial, theta);
    let p = bracket(&block.azimuth, phi);
    let lower =
        block.value(p.lower, t.lower) * (1.0 - t.weight) + block.value(p.lower, t.upper) * t.weight;
    let upper =
        block.value(p.upper, t.lower) * (1.0 - t.weight) + block.value(p.upper, t.upper) * t.weight;
    lower * (1.0 - p.weight) + upper * p.weight
}

/// Resamples one source block onto the uniform target grid.
pub fn resample_block(
    block: &BsdfBlock,
    incidence: f64,
    direction: FrameDirection,
    symmetry: Symmetry,
    resolution: GridResolution,
) -> BsdfBlock {
    let radial = resolution.theta_axis();
    let azimuth = resolution.phi_axis();
    let n_theta = radial.len();
    let values = (0..n_theta * azimuth.len())
        .into_par_iter()
        .map(|i| {
            let cell = GridCell {
                theta: radial[i % n_theta],
                phi: azimuth[i / n_theta],
            };
            resample_cell(block, cell, incidence, direction, symmetry)
        })
        .collect();
    BsdfBlock::with_values(radial, azimuth, values)
}

/// Resamples every block of a dataset onto the uniform target grid.
///
/// The frame transform of each block uses the incidence angle of its slice;
/// TIS values and axes are carried over unchanged.
pub fn resample_dataset(
    dataset: &BsdfDataset,
    direction: FrameDirection,
    resolution: GridResolution,
) -> BsdfDataset {
    let mut blocks = Vec::with_capacity(dataset.blocks.len());
    let mut tis = TisTable::new(dataset.n_rotations(), dataset.n_incidences());
    for i in 0..dataset.n_rotations() {
        for (j, &incidence) in dataset.incidences.iter().enumerate() {
            blocks.push(resample_block(
                dataset.block(i, j),
                incidence,
                direction,
                dataset.symmetry,
                resolution,
            ));
            tis.set(i, j, dataset.tis.get(i, j));
        }
    }
    BsdfDataset {
        scatter_type: dataset.scatter_type,
        symmetry: dataset.symmetry,
        rotations: dataset.rotations.clone(),
        incidences: dataset.incidences.clone(),
        blocks,
        tis,
    }
}

/// Remaps a resampled reflection-convention block to the transmission
/// hemisphere.
///
/// The polar axis becomes `{90, 90 + step, ..., 180}` and the samples are
/// mirrored along theta to match, which is how the Speos grammar stores
/// transmission data.
pub fn remap_to_transmission(block: &BsdfBlock, resolution: GridResolution) -> BsdfBlock {
    let n_theta = block.n_radial();
    let radial: Vec<f64> = (0..n_theta)
        .map(|k| 90.0 + k as f64 * resolution.theta_step)
        .collect();
    let mut out = BsdfBlock::new(radial, block.azimuth.clone());
    for a in 0..block.n_azimuth() {
        for r in 0..n_theta {
            out.set(a, r, block.value(a, n_theta - 1 - r));
        }
    }
    out
}
