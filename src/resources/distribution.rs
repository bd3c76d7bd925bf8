//! Random-variate distributions
//!
//! Service, arrival and change-order times are all drawn from one of a handful of
//! parametric families. Lognormal and normal variates are parameterised by the
//! mean and variance of the variate itself, the way the process owners quote them.

use rand::Rng;
use rand_distr::{Distribution as Sampler, Exp, LogNormal, Normal};
use serde::{Deserialize, Serialize};

/// Parametric distribution of a non-deterministic duration or count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Always the same value
    Constant {
        /// Returned value
        value: f64,
    },
    /// Exponential with the given mean
    Exponential {
        /// Mean of the variate
        mean: f64,
    },
    /// Lognormal with the given mean and variance of the variate
    Lognormal {
        /// Mean of the variate
        mean: f64,
        /// Variance of the variate
        variance: f64,
    },
    /// Normal with the given mean and variance
    Normal {
        /// Mean of the variate
        mean: f64,
        /// Variance of the variate
        variance: f64,
    },
    /// Continuous uniform over `[min, max)`
    Uniform {
        /// Lower bound
        min: f64,
        /// Upper bound
        max: f64,
    },
    /// Discrete uniform over `[min, max]`
    DiscreteUniform {
        /// Lower bound (inclusive)
        min: i64,
        /// Upper bound (inclusive)
        max: i64,
    },
}

impl Distribution {
    /// Lognormal from mean and variance of the variate
    pub fn lognormal(mean: f64, variance: f64) -> Self {
        Distribution::Lognormal { mean, variance }
    }

    /// Normal from mean and variance
    pub fn normal(mean: f64, variance: f64) -> Self {
        Distribution::Normal { mean, variance }
    }

    /// Exponential from its mean
    pub fn exponential(mean: f64) -> Self {
        Distribution::Exponential { mean }
    }

    /// Check the parameters, returning a description of the first problem
    pub fn validate(&self) -> Result<(), String> {
        let finite = |v: f64| v.is_finite();
        match *self {
            Distribution::Constant { value } if !finite(value) => {
                Err(format!("constant value must be finite, got {}", value))
            }
            Distribution::Exponential { mean } if !(finite(mean) && mean > 0.0) => {
                Err(format!("exponential mean must be positive, got {}", mean))
            }
            Distribution::Lognormal { mean, variance }
                if !(finite(mean) && mean > 0.0 && finite(variance) && variance >= 0.0) =>
            {
                Err(format!(
                    "lognormal needs mean > 0 and variance >= 0, got mean {} variance {}",
                    mean, variance
                ))
            }
            Distribution::Normal { mean, variance }
                if !(finite(mean) && finite(variance) && variance >= 0.0) =>
            {
                Err(format!(
                    "normal needs finite mean and variance >= 0, got mean {} variance {}",
                    mean, variance
                ))
            }
            Distribution::Uniform { min, max } if !(finite(min) && finite(max) && min <= max) => {
                Err(format!("uniform needs min <= max, got [{}, {}]", min, max))
            }
            Distribution::DiscreteUniform { min, max } if min > max => {
                Err(format!("discrete uniform needs min <= max, got [{}, {}]", min, max))
            }
            _ => Ok(()),
        }
    }

    /// Same family with the mean scaled by `factor` and the variance by `factor²`
    ///
    /// Used to derive the service times of employees still in training.
    pub fn slowed_by(&self, factor: f64) -> Self {
        match *self {
            Distribution::Constant { value } => Distribution::Constant { value: value * factor },
            Distribution::Exponential { mean } => Distribution::Exponential { mean: mean * factor },
            Distribution::Lognormal { mean, variance } => Distribution::Lognormal {
                mean: mean * factor,
                variance: variance * factor * factor,
            },
            Distribution::Normal { mean, variance } => Distribution::Normal {
                mean: mean * factor,
                variance: variance * factor * factor,
            },
            Distribution::Uniform { min, max } => {
                Distribution::Uniform { min: min * factor, max: max * factor }
            }
            Distribution::DiscreteUniform { .. } => *self,
        }
    }

    /// Mean of the variate
    pub fn mean(&self) -> f64 {
        match *self {
            Distribution::Constant { value } => value,
            Distribution::Exponential { mean } => mean,
            Distribution::Lognormal { mean, .. } | Distribution::Normal { mean, .. } => mean,
            Distribution::Uniform { min, max } => (min + max) / 2.0,
            Distribution::DiscreteUniform { min, max } => (min + max) as f64 / 2.0,
        }
    }

    /// Draw one value
    ///
    /// Parameters that `validate` rejects fall back to the mean.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Distribution::Constant { value } => value,
            Distribution::Exponential { mean } => {
                Exp::new(1.0 / mean).map_or(mean, |exp| exp.sample(rng))
            }
            Distribution::Lognormal { mean, variance } => {
                let sigma_sq = (1.0 + variance / (mean * mean)).ln();
                let mu = mean.ln() - sigma_sq / 2.0;
                LogNormal::new(mu, sigma_sq.sqrt()).map_or(mean, |log| log.sample(rng))
            }
            Distribution::Normal { mean, variance } => {
                Normal::new(mean, variance.sqrt()).map_or(mean, |normal| normal.sample(rng))
            }
            Distribution::Uniform { min, max } => {
                if min == max {
                    min
                } else {
                    rng.gen_range(min..max)
                }
            }
            Distribution::DiscreteUniform { min, max } => rng.gen_range(min..=max) as f64,
        }
    }

    /// Draw one value and truncate it to an integer (discrete families only make sense here)
    pub fn sample_int<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        self.sample(rng) as i64
    }
}
