//! Numerical quadrature support for the TIS normalization.
//!
//! The normalizer reconstructs a block as a continuous bilinear interpolant
//! and integrates it with a nested adaptive Simpson rule at a fixed absolute
//! tolerance. The adaptive refinement means the result carries the inherent
//! tolerance of the scheme; that approximation is accepted, not a defect.

use crate::{data::BsdfBlock, resample::bracket};

/// Recursion depth cap of the adaptive refinement.
const MAX_DEPTH: u32 = 20;

/// Continuous bilinear reconstruction of a block over (theta, phi) in
/// radians.
///
/// Outside the axis ranges the reconstruction extrapolates flat, matching
/// the bracket policy of the resampler; the quadrature only evaluates it
/// inside the ranges.
pub struct BilinearInterpolator {
    thetas: Vec<f64>,
    phis: Vec<f64>,
    block: BsdfBlock,
}

impl BilinearInterpolator {
    /// Builds the interpolant of a block, converting its axes to radians.
    pub fn new(block: &BsdfBlock) -> Self {
        Self {
            thetas: block.radial.iter().map(|t| t.to_radians()).collect(),
            phis: block.azimuth.iter().map(|p| p.to_radians()).collect(),
            block: block.clone(),
        }
    }

    /// Theta axis range in radians.
    pub fn theta_range(&self) -> (f64, f64) {
        (self.thetas[0], *self.thetas.last().unwrap_or(&0.0))
    }

    /// Phi axis range in radians.
    pub fn phi_range(&self) -> (f64, f64) { (self.phis[0], *self.phis.last().unwrap_or(&0.0)) }

    /// Evaluates the reconstruction at (theta, phi) in radians.
    pub fn eval(&self, theta: f64, phi: f64) -> f64 {
        let t = bracket(&self.thetas, theta);
        let p = bracket(&self.phis, phi);
        let lower = self.block.value(p.lower, t.lower) * (1.0 - t.weight)
            + self.block.value(p.lower, t.upper) * t.weight;
        let upper = self.block.value(p.upper, t.lower) * (1.0 - t.weight)
            + self.block.value(p.upper, t.upper) * t.weight;
        lower * (1.0 - p.weight) + upper * p.weight
    }
}

/// Integrates `f(x)` over `[a, b]` with an adaptive Simpson rule to the
/// given absolute tolerance.
pub fn adaptive_simpson<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, eps: f64) -> f64 {
    if a == b {
        return 0.0;
    }
    let m = 0.5 * (a + b);
    let (fa, fm, fb) = (f(a), f(m), f(b));
    let whole = simpson(a, b, fa, fm, fb);
    refine(f, a, b, fa, fm, fb, whole, eps, MAX_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn refine<F: Fn(f64) -> f64>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    eps: f64,
    depth: u32,
) -> f64 {
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let (flm, frm) = (f(lm), f(rm));
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * eps {
        left + right + delta / 15.0
    } else {
        refine(f, a, m, fa, flm, fm, left, 0.5 * eps, depth - 1)
            + refine(f, m, b, fm, frm, fb, right, 0.5 * eps, depth - 1)
    }
}

/// Integrates `f(theta, phi)` over the rectangle
/// `[theta.0, theta.1] x [phi.0, phi.1]`, theta innermost, both dimensions
/// adaptive at the same absolute tolerance.
pub fn integrate_2d<F: Fn(f64, f64) -> f64>(
    f: &F,
    theta: (f64, f64),
    phi: (f64, f64),
    eps: f64,
) -> f64 {
    adaptive_simpson(
        &|p| adaptive_simpson(&|t| f(t, p), theta.0, theta.1, eps),
        phi.0,
        phi.1,
        eps,
    )
}
