//! Speed bounds and the per-sequence maximum feasible speed search.
//!
//! Bounds are solo speeds: how fast a rider could go alone at a given
//! wattage. They bracket where any paceline plan can land and provide the
//! conservative starting speed for the search.

use paceline_config::SpeedSearchConfig;
use paceline_core::physics::speed_from_power;
use paceline_core::rider::ONE_HOUR_SECS;
use paceline_core::{PacelineError, Result, Rider, RiderContribution};

use crate::checker;
use crate::simulator::exertions_at_speed;

/// Standard pull lengths used to bracket speeds, in seconds.
pub const STANDARD_PULL_SECS: [f64; 5] = [30.0, 60.0, 120.0, 180.0, 240.0];

/// A bounding speed and the rider and pull length that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedBound {
    pub rider_index: usize,
    pub rider_id: String,
    pub pull_duration_secs: f64,
    pub speed_kph: f64,
}

/// Fastest solo speed any rider can hold at pull capacity over the standard pulls.
///
/// Riders without fitted curves are ignored. `None` for an empty team.
pub fn upper_bound(riders: &[Rider]) -> Result<Option<SpeedBound>> {
    Ok(extreme(pull_speeds(riders)?, |candidate, best| candidate > best))
}

/// Slowest solo speed any rider can hold at pull capacity over the standard pulls.
pub fn lower_bound(riders: &[Rider]) -> Result<Option<SpeedBound>> {
    Ok(extreme(pull_speeds(riders)?, |candidate, best| candidate < best))
}

/// Fastest solo speed any rider can hold at one-hour power.
pub fn upper_bound_one_hour(riders: &[Rider]) -> Result<Option<SpeedBound>> {
    Ok(extreme(one_hour_speeds(riders)?, |candidate, best| candidate > best))
}

/// Slowest solo speed any rider can hold at one-hour power.
pub fn lower_bound_one_hour(riders: &[Rider]) -> Result<Option<SpeedBound>> {
    Ok(extreme(one_hour_speeds(riders)?, |candidate, best| candidate < best))
}

/// A speed every rider can sustain both on a pull and for an hour.
///
/// The lower of the two lower bounds, each truncated to whole kph, rounded
/// to one decimal place.
pub fn safe_seed_speed(riders: &[Rider]) -> Result<Option<f64>> {
    let (Some(pull), Some(one_hour)) = (lower_bound(riders)?, lower_bound_one_hour(riders)?)
    else {
        return Ok(None);
    };
    let seed = pull.speed_kph.trunc().min(one_hour.speed_kph.trunc());
    Ok(Some((seed * 10.0).round() / 10.0))
}

/// Contributions for a rotation held at `speed_kph`, annotated with violations.
pub fn evaluate_at_speed(
    riders: &[Rider],
    duration_sequence: &[f64],
    speed_kph: f64,
    max_intensity_factor: f64,
) -> Result<Vec<RiderContribution>> {
    let exertions = exertions_at_speed(riders, duration_sequence, speed_kph)?;
    Ok(checker::assess(riders, &exertions, max_intensity_factor))
}

/// Outcome of a maximum feasible speed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedSearchOutcome {
    /// Highest speed found feasible.
    pub speed_kph: f64,
    /// Contributions at that speed.
    pub contributions: Vec<RiderContribution>,
    /// Rotations evaluated.
    pub iterations: u64,
}

/// Fastest speed at which `duration_sequence` breaks no limit, to within
/// `tolerance_kph`, using the default step size and iteration ceiling.
pub fn find_max_feasible_speed(
    riders: &[Rider],
    duration_sequence: &[f64],
    max_intensity_factor: f64,
    start_speed_kph: f64,
    tolerance_kph: f64,
) -> Result<f64> {
    let config = SpeedSearchConfig {
        tolerance_kph,
        ..SpeedSearchConfig::default()
    };
    search_max_feasible_speed(
        riders,
        duration_sequence,
        max_intensity_factor,
        start_speed_kph,
        &config,
    )
    .map(|outcome| outcome.speed_kph)
}

/// Walks up from `start_speed_kph` in fixed increments until a rider breaks a
/// limit, then bisects between the last feasible and first infeasible speed
/// until they are less than `tolerance_kph` apart.
///
/// An infeasible start is walked down instead until a feasible speed appears.
/// Limits tighten monotonically with speed, so every speed above the returned
/// one by at least the tolerance is infeasible.
///
/// # Errors
///
/// - [`PacelineError::DidNotConverge`] once `max_iterations` rotations have
///   been evaluated.
/// - [`PacelineError::Infeasible`] when no positive speed is feasible.
/// - [`PacelineError::InvalidInput`] for non-positive start speed or settings.
pub fn search_max_feasible_speed(
    riders: &[Rider],
    duration_sequence: &[f64],
    max_intensity_factor: f64,
    start_speed_kph: f64,
    config: &SpeedSearchConfig,
) -> Result<SpeedSearchOutcome> {
    if !start_speed_kph.is_finite() || start_speed_kph <= 0.0 {
        return Err(PacelineError::InvalidInput(format!(
            "start speed must be positive, got {start_speed_kph}"
        )));
    }
    if !(config.increment_kph > 0.0 && config.tolerance_kph > 0.0) {
        return Err(PacelineError::InvalidInput(
            "speed increment and tolerance must be positive".to_string(),
        ));
    }

    let mut probe = SpeedProbe {
        riders,
        duration_sequence,
        max_intensity_factor,
        iterations: 0,
        max_iterations: config.max_iterations,
    };

    let mut lower = start_speed_kph;
    let mut upper: Option<f64> = None;
    let mut feasible = probe.feasible_at(lower, None)?;

    while feasible.is_none() {
        upper = Some(lower);
        lower -= config.increment_kph;
        if lower <= 0.0 {
            return Err(PacelineError::Infeasible(format!(
                "limits broken at every speed up to {start_speed_kph} kph"
            )));
        }
        feasible = probe.feasible_at(lower, None)?;
    }

    let mut best = feasible.unwrap_or_default();

    let mut upper = match upper {
        Some(upper) => upper,
        None => loop {
            let next = lower + config.increment_kph;
            match probe.feasible_at(next, Some(lower))? {
                Some(contributions) => {
                    lower = next;
                    best = contributions;
                }
                None => break next,
            }
        },
    };

    while upper - lower > config.tolerance_kph {
        let mid = (lower + upper) / 2.0;
        match probe.feasible_at(mid, Some(lower))? {
            Some(contributions) => {
                lower = mid;
                best = contributions;
            }
            None => upper = mid,
        }
    }

    Ok(SpeedSearchOutcome {
        speed_kph: lower,
        contributions: best,
        iterations: probe.iterations,
    })
}

// Counts rotation evaluations against the iteration ceiling.
struct SpeedProbe<'a> {
    riders: &'a [Rider],
    duration_sequence: &'a [f64],
    max_intensity_factor: f64,
    iterations: u64,
    max_iterations: u64,
}

impl SpeedProbe<'_> {
    /// Contributions at `speed_kph` if feasible, `None` if a limit is broken.
    fn feasible_at(
        &mut self,
        speed_kph: f64,
        last_feasible: Option<f64>,
    ) -> Result<Option<Vec<RiderContribution>>> {
        if self.iterations >= self.max_iterations {
            return Err(PacelineError::DidNotConverge {
                iterations: self.iterations,
                speed_kph: last_feasible.unwrap_or(speed_kph),
            });
        }
        self.iterations += 1;

        let contributions = evaluate_at_speed(
            self.riders,
            self.duration_sequence,
            speed_kph,
            self.max_intensity_factor,
        )?;
        Ok(checker::is_feasible(&contributions).then_some(contributions))
    }
}

fn pull_speeds(riders: &[Rider]) -> Result<Vec<SpeedBound>> {
    let mut speeds = Vec::with_capacity(riders.len() * STANDARD_PULL_SECS.len());
    for (index, rider) in riders.iter().enumerate() {
        if !rider.is_searchable() {
            continue;
        }
        for &pull in &STANDARD_PULL_SECS {
            let watts = rider.pull_capacity_watts(pull).max(0.0);
            speeds.push(SpeedBound {
                rider_index: index,
                rider_id: rider.id.clone(),
                pull_duration_secs: pull,
                speed_kph: speed_from_power(watts, rider.weight_kg, rider.height_cm)?,
            });
        }
    }
    Ok(speeds)
}

fn one_hour_speeds(riders: &[Rider]) -> Result<Vec<SpeedBound>> {
    riders
        .iter()
        .enumerate()
        .filter(|(_, rider)| rider.is_searchable())
        .map(|(index, rider)| {
            let watts = rider.one_hour_watts().max(0.0);
            Ok(SpeedBound {
                rider_index: index,
                rider_id: rider.id.clone(),
                pull_duration_secs: ONE_HOUR_SECS,
                speed_kph: speed_from_power(watts, rider.weight_kg, rider.height_cm)?,
            })
        })
        .collect()
}

// First bound that `better` prefers over every other; earlier entries win ties.
fn extreme(bounds: Vec<SpeedBound>, better: impl Fn(f64, f64) -> bool) -> Option<SpeedBound> {
    bounds.into_iter().reduce(|best, candidate| {
        if better(candidate.speed_kph, best.speed_kph) {
            candidate
        } else {
            best
        }
    })
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
