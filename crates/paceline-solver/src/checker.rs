//! Aggregation of exertions into per-rider contributions and the
//! physiological limits they are checked against.
//!
//! Normalized power follows the usual cycling convention: the rotation is
//! expanded to one sample per second (each duration rounded to the nearest
//! whole second), smoothed with a 5 second rolling mean,
//! raised to the 4th power, averaged, and the 4th root taken.
//!
//! Violations are advisory. They annotate a contribution and never fail.

use paceline_core::{Rider, RiderContribution, RiderExertion};

/// Rolling window for normalized power, in seconds.
pub const NORMALIZED_POWER_WINDOW_SECS: usize = 5;

/// Number of one-second samples a slot of `duration_secs` contributes to
/// normalized power. Negative durations contribute nothing.
#[inline]
pub fn whole_seconds(duration_secs: f64) -> usize {
    duration_secs.max(0.0).round() as usize
}

/// Divides, returning 0 for a zero or non-finite result.
#[inline]
pub fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        0.0
    }
}

/// Builds one contribution per rider from their rotation exertions.
///
/// `exertions` is indexed like `riders`. Contributions carry no violation
/// reason; see [`assess`] for the annotated form.
pub fn aggregate(riders: &[Rider], exertions: &[Vec<RiderExertion>]) -> Vec<RiderContribution> {
    riders
        .iter()
        .zip(exertions)
        .map(|(rider, slots)| contribution(rider, slots))
        .collect()
}

/// Aggregates and annotates every contribution that breaks a limit.
pub fn assess(
    riders: &[Rider],
    exertions: &[Vec<RiderExertion>],
    max_intensity_factor: f64,
) -> Vec<RiderContribution> {
    let mut contributions = aggregate(riders, exertions);
    for (contribution, rider) in contributions.iter_mut().zip(riders) {
        contribution.effort_constraint_violation_reason =
            violates(contribution, max_intensity_factor, rider);
    }
    contributions
}

/// Returns a human-readable reason when the contribution breaks a limit.
///
/// Two independent conditions are checked: intensity factor at or above
/// `max_intensity_factor`, and pull wattage at or above the rider's pull
/// capacity for the pull duration. Riders who do not pull are only checked
/// for intensity.
pub fn violates(
    contribution: &RiderContribution,
    max_intensity_factor: f64,
    rider: &Rider,
) -> Option<String> {
    let mut reasons = Vec::new();

    if contribution.intensity_factor >= max_intensity_factor {
        reasons.push(format!(
            "intensity factor {:.3} at or above ceiling {:.3}",
            contribution.intensity_factor, max_intensity_factor
        ));
    }

    if contribution.pull_duration_secs > 0.0 {
        let capacity = rider.pull_capacity_watts(contribution.pull_duration_secs);
        if contribution.pull_watts >= capacity {
            reasons.push(format!(
                "pull of {:.0} W for {:.0} s at or above capacity of {:.0} W",
                contribution.pull_watts, contribution.pull_duration_secs, capacity
            ));
        }
    }

    if reasons.is_empty() {
        None
    } else {
        Some(reasons.join("; "))
    }
}

/// True when no contribution carries a violation.
pub fn is_feasible(contributions: &[RiderContribution]) -> bool {
    contributions.iter().all(|c| !c.is_violated())
}

/// Time-weighted average power: total work over total time.
pub fn average_watts(exertions: &[RiderExertion]) -> f64 {
    let kilojoules: f64 = exertions.iter().map(|e| e.kilojoules).sum();
    let seconds: f64 = exertions.iter().map(|e| e.duration_secs).sum();
    safe_divide(1000.0 * kilojoules, seconds)
}

/// Normalized power over the rotation. Zero when the rotation is shorter
/// than the rolling window.
pub fn normalized_watts(exertions: &[RiderExertion]) -> f64 {
    let samples = exertions
        .iter()
        .flat_map(|e| std::iter::repeat(e.wattage).take(whole_seconds(e.duration_secs)));

    let mut window = [0.0; NORMALIZED_POWER_WINDOW_SECS];
    let mut window_sum = 0.0;
    let mut seen = 0usize;
    let mut fourth_power_sum = 0.0;
    let mut rolled = 0usize;

    for sample in samples {
        let slot = seen % NORMALIZED_POWER_WINDOW_SECS;
        window_sum += sample - window[slot];
        window[slot] = sample;
        seen += 1;
        if seen >= NORMALIZED_POWER_WINDOW_SECS {
            let mean = window_sum / NORMALIZED_POWER_WINDOW_SECS as f64;
            fourth_power_sum += mean.powi(4);
            rolled += 1;
        }
    }

    if rolled == 0 {
        return 0.0;
    }
    (fourth_power_sum / rolled as f64).powf(0.25)
}

/// Time-weighted mean speed over one rider's rotation.
pub fn team_average_speed(exertions: &[RiderExertion]) -> f64 {
    let distance: f64 = exertions
        .iter()
        .map(|e| e.speed_kph * e.duration_secs / 3600.0)
        .sum();
    let hours: f64 = exertions.iter().map(|e| e.duration_secs).sum::<f64>() / 3600.0;
    safe_divide(distance, hours)
}

/// Population standard deviation of intensity factors.
pub fn intensity_dispersion(contributions: &[RiderContribution]) -> f64 {
    if contributions.is_empty() {
        return 0.0;
    }
    let n = contributions.len() as f64;
    let mean = contributions.iter().map(|c| c.intensity_factor).sum::<f64>() / n;
    let variance = contributions
        .iter()
        .map(|c| (c.intensity_factor - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.sqrt()
}

fn contribution(rider: &Rider, exertions: &[RiderExertion]) -> RiderContribution {
    let (pull_duration_secs, pull_watts) = exertions
        .iter()
        .find(|e| e.position == 1)
        .map_or((0.0, 0.0), |e| (e.duration_secs, e.wattage));

    let positions = exertions.iter().map(|e| e.position).max().unwrap_or(0);
    let mut position_watts = vec![0.0; positions];
    for e in exertions {
        if let Some(watts) = e.position.checked_sub(1).and_then(|i| position_watts.get_mut(i)) {
            *watts = e.wattage;
        }
    }

    let one_hour = rider.one_hour_watts();
    let normalized = normalized_watts(exertions);

    RiderContribution {
        rider_id: rider.id.clone(),
        pull_duration_secs,
        pull_watts,
        pull_wkg: safe_divide(pull_watts, rider.weight_kg),
        pull_ratio_to_one_hour: safe_divide(pull_watts, one_hour),
        pull_capacity_watts: if pull_duration_secs > 0.0 {
            rider.pull_capacity_watts(pull_duration_secs)
        } else {
            0.0
        },
        position_watts,
        total_kilojoules: exertions.iter().map(|e| e.kilojoules).sum(),
        average_watts: average_watts(exertions),
        normalized_watts: normalized,
        intensity_factor: safe_divide(normalized, one_hour),
        effort_constraint_violation_reason: None,
    }
}
