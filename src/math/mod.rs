//! Numerical primitives for partition selection.
//!
//! - [`delta`] - per-partition budget split
//! - [`gaussian`] - normal tails, quantile and analytic Gaussian calibration
//! - [`noise`] - Laplace and Gaussian samplers over a caller-supplied RNG

pub mod delta;
pub mod gaussian;
pub mod noise;

pub use delta::{adjusted_delta, adjusted_epsilon};
pub use gaussian::{
    calibrate_gaussian_sigma, inverse_error_function, normal_upper_quantile, normal_upper_tail,
    threshold_quantile,
};
pub use noise::{GaussianNoise, LaplaceNoise, NoiseSampler};
