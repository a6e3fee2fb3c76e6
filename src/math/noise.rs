//! Noise samplers.
//!
//! The random source is always supplied by the caller. Nothing here touches a
//! thread-local or global generator, so a seeded `ChaCha20Rng` reproduces
//! every draw.

use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

use crate::error::{Result, SelectionError};

/// A zero-centred continuous noise distribution.
pub trait NoiseSampler {
    /// Draw one noise value.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64;
}

/// Laplace(0, b) noise.
#[derive(Clone, Debug)]
pub struct LaplaceNoise {
    scale: f64,
    exp: Exp<f64>,
}

impl LaplaceNoise {
    /// Build a sampler with scale `b > 0`.
    pub fn new(scale: f64) -> Result<Self> {
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(SelectionError::Calibration(format!(
                "Laplace scale must be finite and positive, got {}",
                scale
            )));
        }
        let exp = Exp::new(1.0 / scale)
            .map_err(|e| SelectionError::Calibration(format!("Laplace scale {}: {}", scale, e)))?;
        Ok(Self { scale, exp })
    }

    /// Scale parameter `b`.
    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl NoiseSampler for LaplaceNoise {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Difference of two iid exponentials with rate 1/b is Laplace(0, b).
        self.exp.sample(rng) - self.exp.sample(rng)
    }
}

/// Normal(0, σ²) noise.
#[derive(Clone, Debug)]
pub struct GaussianNoise {
    sigma: f64,
    normal: Normal<f64>,
}

impl GaussianNoise {
    /// Build a sampler with standard deviation `sigma > 0`.
    pub fn new(sigma: f64) -> Result<Self> {
        if !(sigma > 0.0 && sigma.is_finite()) {
            return Err(SelectionError::Calibration(format!(
                "Gaussian sigma must be finite and positive, got {}",
                sigma
            )));
        }
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| SelectionError::Calibration(format!("Gaussian sigma {}: {}", sigma, e)))?;
        Ok(Self { sigma, normal })
    }

    /// Standard deviation.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl NoiseSampler for GaussianNoise {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.normal.sample(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn moments<S: NoiseSampler>(sampler: &S, n: usize) -> (f64, f64) {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let draws: Vec<f64> = (0..n).map(|_| sampler.sample(&mut rng)).collect();
        let mean = draws.iter().sum::<f64>() / n as f64;
        let var = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
        (mean, var)
    }

    #[test]
    fn test_laplace_moments() {
        let noise = LaplaceNoise::new(2.0).unwrap();
        let (mean, var) = moments(&noise, 200_000);
        assert!(mean.abs() < 0.05, "mean={}", mean);
        // Var = 2b²
        assert!((var - 8.0).abs() < 0.3, "var={}", var);
    }

    #[test]
    fn test_gaussian_moments() {
        let noise = GaussianNoise::new(3.0).unwrap();
        let (mean, var) = moments(&noise, 200_000);
        assert!(mean.abs() < 0.05, "mean={}", mean);
        assert!((var - 9.0).abs() < 0.2, "var={}", var);
    }

    #[test]
    fn test_same_seed_same_draws() {
        let noise = LaplaceNoise::new(1.0).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(noise.sample(&mut a), noise.sample(&mut b));
        }
    }

    #[test]
    fn test_rejects_degenerate_scales() {
        assert!(LaplaceNoise::new(0.0).is_err());
        assert!(LaplaceNoise::new(f64::INFINITY).is_err());
        assert!(GaussianNoise::new(-1.0).is_err());
        assert!(GaussianNoise::new(f64::NAN).is_err());
    }
}
