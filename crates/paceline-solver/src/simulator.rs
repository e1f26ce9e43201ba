//! Per-rider workload over one paceline rotation.
//!
//! Slot `j` of a rotation is the pull of rider `j + 1`. During that slot rider
//! `k` (1-based) rides in position `(k + n - j - 1) mod n + 1`, so every rider
//! visits every position exactly once per rotation.
//!
//! This module runs inside evaluation workers and performs no logging.

use paceline_core::physics::{drag_ratio_for_position, kilojoules, power_from_speed};
use paceline_core::{PacelineError, Result, Rider, RiderExertion, RiderWorkAssignment};

/// Builds each rider's work assignments, indexed like `riders`.
///
/// If either sequence is empty every rider gets a single
/// [`RiderWorkAssignment::IDLE`]. Slots beyond the shorter sequence get zero
/// duration and speed; entries beyond the rider count are ignored.
pub fn simulate(
    riders: &[Rider],
    duration_sequence: &[f64],
    speed_sequence: &[f64],
) -> Vec<Vec<RiderWorkAssignment>> {
    let n = riders.len();
    if duration_sequence.is_empty() || speed_sequence.is_empty() {
        return vec![vec![RiderWorkAssignment::IDLE]; n];
    }

    let usable = duration_sequence.len().min(speed_sequence.len());
    (1..=n)
        .map(|k| {
            (0..n)
                .map(|j| {
                    let position = (k + n - j - 1) % n + 1;
                    if j < usable {
                        RiderWorkAssignment::new(position, duration_sequence[j], speed_sequence[j])
                    } else {
                        RiderWorkAssignment::new(position, 0.0, 0.0)
                    }
                })
                .collect()
        })
        .collect()
}

/// Converts assignments into wattage and energy per slot.
///
/// Wattage is the solo power at the slot speed scaled by the draft ratio of
/// the slot position.
///
/// # Errors
///
/// [`PacelineError::InvalidInput`] if `assignments` does not line up with
/// `riders` or a rider has a non-positive weight.
pub fn to_exertions(
    riders: &[Rider],
    assignments: &[Vec<RiderWorkAssignment>],
) -> Result<Vec<Vec<RiderExertion>>> {
    if riders.len() != assignments.len() {
        return Err(PacelineError::InvalidInput(format!(
            "{} riders but {} assignment lists",
            riders.len(),
            assignments.len()
        )));
    }

    riders
        .iter()
        .zip(assignments)
        .map(|(rider, slots)| {
            slots
                .iter()
                .map(|slot| {
                    let solo = power_from_speed(slot.speed_kph, rider.weight_kg, rider.height_cm)?;
                    let wattage = solo * drag_ratio_for_position(slot.position);
                    Ok(RiderExertion {
                        position: slot.position,
                        duration_secs: slot.duration_secs,
                        speed_kph: slot.speed_kph,
                        wattage,
                        kilojoules: kilojoules(wattage, slot.duration_secs),
                    })
                })
                .collect()
        })
        .collect()
}

/// Simulates a rotation held at a constant speed.
pub fn exertions_at_speed(
    riders: &[Rider],
    duration_sequence: &[f64],
    speed_kph: f64,
) -> Result<Vec<Vec<RiderExertion>>> {
    let speeds = vec![speed_kph; duration_sequence.len()];
    to_exertions(riders, &simulate(riders, duration_sequence, &speeds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_test::riders::{rider, three_rider_team};
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_no_op_default() {
        let riders = three_rider_team();
        let assignments = simulate(&riders, &[], &[]);
        assert_eq!(assignments.len(), 3);
        for slots in &assignments {
            assert_eq!(slots, &vec![RiderWorkAssignment::IDLE]);
        }

        let assignments = simulate(&riders, &[30.0, 30.0, 30.0], &[]);
        assert!(assignments.iter().all(|s| s == &vec![RiderWorkAssignment::IDLE]));
    }

    #[test]
    fn test_empty_team() {
        assert!(simulate(&[], &[30.0], &[40.0]).is_empty());
    }

    #[test]
    fn test_leader_of_each_slot() {
        let riders = three_rider_team();
        let assignments = simulate(&riders, &[30.0, 60.0, 90.0], &[40.0, 41.0, 42.0]);

        // Rider k leads in slot k - 1 with its own duration.
        for (k, slots) in assignments.iter().enumerate() {
            assert_eq!(slots[k].position, 1);
            assert_eq!(slots[k].duration_secs, [30.0, 60.0, 90.0][k]);
        }
        // The rider behind the leader in slot 0 is the second rider.
        assert_eq!(assignments[1][0].position, 2);
        assert_eq!(assignments[2][0].position, 3);
        assert_eq!(assignments[0][1].position, 3);
    }

    #[test]
    fn test_cyclic_completeness() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..50 {
            let n = rng.random_range(1..=9);
            let riders: Vec<_> = (0..n)
                .map(|i| rider(&format!("r{i}"), 250.0, 70.0))
                .collect();
            let durations: Vec<f64> = (0..n).map(|_| rng.random_range(0..=240) as f64).collect();
            let speeds: Vec<f64> = (0..n).map(|_| rng.random_range(30.0..50.0)).collect();

            let assignments = simulate(&riders, &durations, &speeds);
            assert_eq!(assignments.len(), n);
            for slots in &assignments {
                let mut positions: Vec<usize> = slots.iter().map(|a| a.position).collect();
                positions.sort_unstable();
                assert_eq!(positions, (1..=n).collect::<Vec<_>>());
            }
            // Every slot has exactly one rider in each position.
            for j in 0..n {
                let mut positions: Vec<usize> = assignments.iter().map(|s| s[j].position).collect();
                positions.sort_unstable();
                assert_eq!(positions, (1..=n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_short_sequences_pad_with_zero() {
        let riders = three_rider_team();
        let assignments = simulate(&riders, &[30.0, 60.0], &[40.0, 40.0, 40.0]);
        for slots in &assignments {
            assert_eq!(slots[2].duration_secs, 0.0);
            assert_eq!(slots[2].speed_kph, 0.0);
        }
        assert_eq!(assignments[2][2].position, 1);
    }

    #[test]
    fn test_long_sequences_truncated() {
        let riders = three_rider_team();
        let assignments = simulate(&riders, &[30.0; 5], &[40.0; 5]);
        assert!(assignments.iter().all(|s| s.len() == 3));
    }

    #[test]
    fn test_exertions_apply_draft() {
        let riders = three_rider_team();
        let exertions = exertions_at_speed(&riders, &[30.0, 30.0, 30.0], 40.0).unwrap();
        let alice = &exertions[0];
        let solo = power_from_speed(40.0, riders[0].weight_kg, riders[0].height_cm).unwrap();

        let front = alice.iter().find(|e| e.position == 1).unwrap();
        let second = alice.iter().find(|e| e.position == 2).unwrap();
        assert!((front.wattage - solo).abs() < 1e-9);
        assert!((second.wattage - solo * drag_ratio_for_position(2)).abs() < 1e-9);
        assert!((front.kilojoules - solo * 30.0 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_exertions_reject_mismatched_lengths() {
        let riders = three_rider_team();
        let assignments = simulate(&riders[..2], &[30.0, 30.0], &[40.0, 40.0]);
        assert!(to_exertions(&riders, &assignments).is_err());
    }
}
