//! Standard normal tails and analytic Gaussian calibration.
//!
//! All tail functions go through `erfc` so that probabilities far out in the
//! tail (the regime partition selection lives in) keep their relative
//! precision instead of collapsing to `1 - 1 = 0`.

use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::SQRT_2;
use tracing::warn;

use crate::error::{Result, SelectionError};

/// Upper bound on bisection steps (bracket growth and refinement combined).
pub const MAX_SIGMA_SEARCH_ITERATIONS: usize = 2048;

/// Relative width at which the sigma bracket is considered converged.
pub const SIGMA_RELATIVE_TOLERANCE: f64 = 1e-3;

/// `Φ(x)`, the standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// `Φc(x) = 1 - Φ(x)`, the standard normal upper tail.
pub fn normal_upper_tail(x: f64) -> f64 {
    0.5 * erfc(x / SQRT_2)
}

/// Quantile `z` with `Φc(z) = p`, for `p` in `(0, 1)`.
///
/// Equivalent to `Φ⁻¹(1 - p)` without forming `1 - p`.
pub fn normal_upper_quantile(p: f64) -> f64 {
    SQRT_2 * erfc_inv(2.0 * p)
}

/// Inverse error function, single-precision polynomial of Giles (2010),
/// "Approximating the erfinv function".
///
/// Accurate to about 1e-7 relative for `|x| < 1 - 1e-7`; past that it
/// drifts from the exact inverse.
///
/// Thresholds are placed with this approximation rather than the exact
/// inverse so that calibrated constants agree with other partition
/// selection implementations bit for bit.
pub fn inverse_error_function(x: f64) -> f64 {
    let w = -((1.0 - x) * (1.0 + x)).ln();
    let (w, coefficients) = if w < 5.0 {
        (
            w - 2.5,
            [
                2.810_226_36e-8,
                3.432_739_39e-7,
                -3.523_387_7e-6,
                -4.391_506_54e-6,
                2.185_808_7e-4,
                -1.253_725_03e-3,
                -4.177_681_64e-3,
                2.466_407_27e-1,
                1.501_409_41,
            ],
        )
    } else {
        (
            w.sqrt() - 3.0,
            [
                -2.002_142_57e-4,
                1.009_505_58e-4,
                1.349_343_22e-3,
                -3.673_428_44e-3,
                5.739_507_73e-3,
                -7.622_461_3e-3,
                9.438_870_47e-3,
                1.001_674_06,
                2.832_976_82,
            ],
        )
    };
    let p = coefficients
        .iter()
        .skip(1)
        .fold(coefficients[0], |acc, &c| c + acc * w);
    p * x
}

/// Quantile `z` with `Φc(z) ≈ p`, via [`inverse_error_function`].
///
/// Used to place thresholds; `x = 2(1 - p) - 1` is formed literally so the
/// rounding matches other implementations.
pub fn threshold_quantile(p: f64) -> f64 {
    SQRT_2 * inverse_error_function(2.0 * (1.0 - p) - 1.0)
}

/// Delta achieved by Gaussian noise with standard deviation `sigma` for an
/// L2 sensitivity of `l2_sensitivity` under budget `epsilon`.
///
/// This is the exact characterisation of Balle & Wang (2018):
/// `Φ(s/2σ - εσ/s) - e^ε Φ(-s/2σ - εσ/s)`.
pub fn analytic_gaussian_delta(epsilon: f64, l2_sensitivity: f64, sigma: f64) -> f64 {
    let a = l2_sensitivity / (2.0 * sigma);
    let b = epsilon * sigma / l2_sensitivity;
    let lower = normal_cdf(-a - b);
    // e^ε alone overflows past ε ≈ 709; the product does not.
    let scaled = if lower > 0.0 {
        (epsilon + lower.ln()).exp()
    } else {
        0.0
    };
    normal_cdf(a - b) - scaled
}

/// Smallest standard deviation (to within [`SIGMA_RELATIVE_TOLERANCE`]) for
/// which [`analytic_gaussian_delta`] does not exceed `delta`.
///
/// Returns the sigma together with the number of bisection steps taken.
/// The returned value always satisfies the delta bound: it is the upper end
/// of the bracket.
pub fn calibrate_gaussian_sigma(
    epsilon: f64,
    delta: f64,
    l2_sensitivity: f64,
) -> Result<(f64, usize)> {
    if !(l2_sensitivity > 0.0 && l2_sensitivity.is_finite()) {
        return Err(SelectionError::Calibration(format!(
            "L2 sensitivity must be finite and positive, got {}",
            l2_sensitivity
        )));
    }

    let mut lower = 0.0_f64;
    let mut upper = l2_sensitivity;
    let mut iterations = 0usize;

    while analytic_gaussian_delta(epsilon, l2_sensitivity, upper) > delta {
        if iterations >= MAX_SIGMA_SEARCH_ITERATIONS || !upper.is_finite() {
            return Err(SelectionError::Calibration(format!(
                "no sigma bracket found for epsilon={}, delta={}",
                epsilon, delta
            )));
        }
        lower = upper;
        upper *= 2.0;
        iterations += 1;
    }

    while upper - lower > SIGMA_RELATIVE_TOLERANCE * lower {
        if iterations >= MAX_SIGMA_SEARCH_ITERATIONS {
            warn!(
                epsilon,
                delta,
                lower,
                upper,
                "sigma search hit its iteration cap, keeping the conservative bound"
            );
            break;
        }
        let mid = lower + (upper - lower) / 2.0;
        if analytic_gaussian_delta(epsilon, l2_sensitivity, mid) > delta {
            lower = mid;
        } else {
            upper = mid;
        }
        iterations += 1;
    }

    Ok((upper, iterations))
}
