//! Request-scoped speed limits used to bound partial sequences.

use paceline_core::physics::{drag_ratio_for_position, speed_from_power};
use paceline_core::Rider;

use crate::checker::{whole_seconds, NORMALIZED_POWER_WINDOW_SECS};

/// Solo speed at which each rider's pull wattage reaches pull capacity, for
/// each candidate duration.
///
/// A pull is infeasible at or above this speed, so the limit bounds the
/// speed any sequence assigning that duration to that rider can reach.
/// Built once per request and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct PullLimits {
    durations: Vec<f64>,
    // Rider-major: speeds[rider * durations.len() + duration_index].
    speeds: Vec<f64>,
}

impl PullLimits {
    /// `durations` should be sorted and distinct; see
    /// [`PacelineIngredients::distinct_pull_durations`](paceline_core::PacelineIngredients::distinct_pull_durations).
    pub fn new(riders: &[Rider], durations: &[f64]) -> Self {
        let mut speeds = Vec::with_capacity(riders.len() * durations.len());
        for rider in riders {
            for &duration in durations {
                speeds.push(pull_limit(rider, duration));
            }
        }
        Self {
            durations: durations.to_vec(),
            speeds,
        }
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }

    pub fn rider_count(&self) -> usize {
        if self.durations.is_empty() {
            0
        } else {
            self.speeds.len() / self.durations.len()
        }
    }

    /// Limit for `rider` pulling the duration at `duration_index`. Zero when
    /// either index is out of range.
    pub fn speed_limit(&self, rider: usize, duration_index: usize) -> f64 {
        if duration_index >= self.durations.len() {
            return 0.0;
        }
        self.speeds
            .get(rider * self.durations.len() + duration_index)
            .copied()
            .unwrap_or(0.0)
    }
}

// Riders who do not pull are unconstrained. A capacity that cannot be
// inverted to a speed rules the pull out.
fn pull_limit(rider: &Rider, duration: f64) -> f64 {
    if duration <= 0.0 {
        return f64::INFINITY;
    }
    let capacity = rider.pull_capacity_watts(duration).max(0.0);
    speed_from_power(capacity, rider.weight_kg, rider.height_cm).unwrap_or(0.0)
}

/// Speed caps implied by the intensity ceiling.
///
/// Normalized power is at least the mean of its rolling averages. Over a
/// rotation of `T` samples that mean is at least `(S - L·p) / (T - L)`,
/// where `S` is the sample sum, `p` the largest sample and `L` one less than
/// the window. Every sample of a rider at speed `v` is the solo power
/// `P(v)` scaled by a draft ratio of at most one, so the intensity factor
/// is at least `P(v)·f / one-hour watts` with `f = (W - L) / (T - L)` and
/// `W` the ratio-weighted duration. The cap for a partial sequence takes
/// the smallest `f` any completion can reach.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityLimits {
    // Whole seconds per duration index, ascending.
    seconds: Vec<f64>,
    riders: Vec<CeilingRider>,
}

#[derive(Debug, Clone, PartialEq)]
struct CeilingRider {
    weight_kg: f64,
    height_cm: f64,
    ceiling_watts: f64,
}

impl IntensityLimits {
    /// `durations` should be sorted and distinct, as for [`PullLimits`].
    pub fn new(riders: &[Rider], durations: &[f64], max_intensity_factor: f64) -> Self {
        Self {
            seconds: durations.iter().map(|&d| whole_seconds(d) as f64).collect(),
            riders: riders
                .iter()
                .map(|rider| CeilingRider {
                    weight_kg: rider.weight_kg,
                    height_cm: rider.height_cm,
                    ceiling_watts: max_intensity_factor * rider.one_hour_watts(),
                })
                .collect(),
        }
    }

    /// Speed no completion of `prefix` can reach without some rider's
    /// intensity factor meeting the ceiling.
    ///
    /// `prefix` holds duration indices for the first riders in rotation
    /// order. Infinite when no rider is constrained, e.g. when some
    /// completion is too short to fill one rolling window.
    pub fn speed_limit(&self, prefix: &[usize]) -> f64 {
        let n = self.riders.len();
        let (Some(&shortest), Some(&longest)) = (self.seconds.first(), self.seconds.last()) else {
            return f64::INFINITY;
        };

        let mut limit = f64::INFINITY;
        for (k, rider) in self.riders.iter().enumerate() {
            let mut assigned_secs = 0.0;
            let mut assigned_work = 0.0;
            for (slot, &index) in prefix.iter().enumerate().take(n) {
                let secs = self.seconds.get(index).copied().unwrap_or(0.0);
                assigned_secs += secs;
                assigned_work += secs * slot_ratio(k, slot, n);
            }
            let mut free: Vec<f64> = (prefix.len().min(n)..n)
                .map(|slot| slot_ratio(k, slot, n))
                .collect();
            free.sort_by(f64::total_cmp);

            let Some(factor) = least_factor(assigned_secs, assigned_work, &free, shortest, longest)
            else {
                continue;
            };
            if let Ok(kph) =
                speed_from_power(rider.ceiling_watts / factor, rider.weight_kg, rider.height_cm)
            {
                limit = limit.min(kph);
            }
        }
        limit
    }
}

// Draft ratio of 0-based rider `k` during slot `slot`.
fn slot_ratio(k: usize, slot: usize, n: usize) -> f64 {
    drag_ratio_for_position((k + n - slot) % n + 1)
}

// Smallest `(W - L) / (T - L)` over completions. The ratio is linear
// fractional in each free duration, so an optimum gives the longest duration
// to a prefix of the free slots sorted by ratio and the shortest to the rest.
// None when some completion cannot fill a window or the factor is not
// positive.
fn least_factor(
    assigned_secs: f64,
    assigned_work: f64,
    free_ratios: &[f64],
    shortest: f64,
    longest: f64,
) -> Option<f64> {
    let lag = (NORMALIZED_POWER_WINDOW_SECS - 1) as f64;
    let mut least = f64::INFINITY;
    for long in 0..=free_ratios.len() {
        let (long_ratios, short_ratios) = free_ratios.split_at(long);
        let secs = assigned_secs
            + long as f64 * longest
            + short_ratios.len() as f64 * shortest;
        if secs <= lag {
            return None;
        }
        let work = assigned_work
            + longest * long_ratios.iter().sum::<f64>()
            + shortest * short_ratios.iter().sum::<f64>();
        least = least.min((work - lag) / (secs - lag));
    }
    (least > 0.0).then_some(least)
}
