//! Re-normalization of resampled data against the measured total
//! integrated scatter.
//!
//! Resampling does not preserve the physical integral of a block, so every
//! slice is rescaled until the hemispherical integral of its continuous
//! reconstruction matches the TIS scalar recorded for that slice.

use crate::{
    data::{BsdfBlock, BsdfDataset},
    quadrature::{integrate_2d, BilinearInterpolator},
};
use std::f64::consts::PI;

/// Absolute tolerance of the adaptive quadrature, per dimension.
pub const QUADRATURE_EPSILON: f64 = 0.1;

/// Integrates `(1/pi) * value * sin(theta) * cos(theta)` over the block's
/// angular domain.
///
/// The block is reconstructed as a continuous bilinear interpolant and the
/// cosine-weighted projection is integrated over
/// `[min theta, max theta] x [min phi, max phi]` in radians. The magnitude
/// of the integral approximates the TIS of the block; the sign flips for
/// transmission axes (theta beyond 90 degrees), hence the absolute value.
pub fn hemispherical_integral(block: &BsdfBlock) -> f64 {
    let interp = BilinearInterpolator::new(block);
    let f = |theta: f64, phi: f64| interp.eval(theta, phi) * theta.sin() * theta.cos() / PI;
    integrate_2d(
        &f,
        interp.theta_range(),
        interp.phi_range(),
        QUADRATURE_EPSILON,
    )
    .abs()
}

/// Rescales every block of the dataset in place so that its hemispherical
/// integral matches the TIS recorded for its slice.
///
/// A non-positive integral means degenerate data with no physically
/// meaningful normalization; the block is left unscaled and a warning is
/// emitted.
pub fn normalize_dataset(dataset: &mut BsdfDataset) {
    for i in 0..dataset.n_rotations() {
        for j in 0..dataset.n_incidences() {
            let integral = hemispherical_integral(dataset.block(i, j));
            let tis = dataset.tis.get(i, j);
            if integral > 0.0 {
                let factor = tis / integral;
                log::debug!(
                    "normalization: rotation {i} incidence {j}: integral {integral:.6}, TIS \
                     {tis}, factor {factor:.6}"
                );
                dataset.block_mut(i, j).scale(factor);
            } else {
                log::warn!(
                    "normalization skipped for rotation {i} incidence {j}: hemispherical \
                     integral is zero, data is degenerate"
                );
            }
        }
    }
}
