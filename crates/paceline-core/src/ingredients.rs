//! The input bundle for one planning request.

use crate::error::{PacelineError, Result};
use crate::rider::Rider;

/// Riders in rotation order plus the search parameters for one request.
///
/// Created once per request and never mutated by the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacelineIngredients {
    /// Riders head to tail.
    pub riders: Vec<Rider>,
    /// Known-feasible speed to start searching from. Derived from speed
    /// bounds when absent.
    pub seed_speed_kph: Option<f64>,
    /// Candidate pull durations in seconds.
    pub pull_durations: Vec<f64>,
    /// Ceiling on intensity factor for every rider.
    pub max_intensity_factor: f64,
}

impl PacelineIngredients {
    pub fn new(riders: Vec<Rider>, pull_durations: Vec<f64>, max_intensity_factor: f64) -> Self {
        Self {
            riders,
            seed_speed_kph: None,
            pull_durations,
            max_intensity_factor,
        }
    }

    pub fn with_seed_speed(mut self, kph: f64) -> Self {
        self.seed_speed_kph = Some(kph);
        self
    }

    /// Checks numeric inputs. An empty or single-rider team is not an error.
    pub fn validate(&self) -> Result<()> {
        for rider in &self.riders {
            rider.validate()?;
        }
        if self.pull_durations.is_empty() {
            return Err(PacelineError::InvalidInput(
                "at least one candidate pull duration is required".to_string(),
            ));
        }
        if let Some(bad) = self
            .pull_durations
            .iter()
            .find(|d| !d.is_finite() || **d < 0.0)
        {
            return Err(PacelineError::InvalidInput(format!(
                "pull durations must be non-negative, got {bad}"
            )));
        }
        if !self.pull_durations.iter().any(|d| *d > 0.0) {
            return Err(PacelineError::InvalidInput(
                "at least one pull duration must be positive".to_string(),
            ));
        }
        if !self.max_intensity_factor.is_finite() || self.max_intensity_factor <= 0.0 {
            return Err(PacelineError::InvalidInput(format!(
                "max intensity factor must be positive, got {}",
                self.max_intensity_factor
            )));
        }
        if let Some(seed) = self.seed_speed_kph {
            if !seed.is_finite() || seed <= 0.0 {
                return Err(PacelineError::InvalidInput(format!(
                    "seed speed must be positive, got {seed}"
                )));
            }
        }
        Ok(())
    }

    /// Candidate durations sorted ascending with duplicates removed.
    pub fn distinct_pull_durations(&self) -> Vec<f64> {
        let mut durations = self.pull_durations.clone();
        durations.sort_by(f64::total_cmp);
        durations.dedup();
        durations
    }

    /// The same request restricted to the `n` riders with the highest
    /// power-to-weight ratio. Rotation order among them is preserved and
    /// ties keep the earlier rider.
    pub fn with_n_strongest(&self, n: usize) -> Self {
        let mut ranked: Vec<usize> = (0..self.riders.len()).collect();
        ranked.sort_by(|&a, &b| {
            self.riders[b]
                .power_to_weight()
                .total_cmp(&self.riders[a].power_to_weight())
                .then(a.cmp(&b))
        });
        ranked.truncate(n);
        ranked.sort_unstable();

        Self {
            riders: ranked.into_iter().map(|i| self.riders[i].clone()).collect(),
            ..self.clone()
        }
    }
}
