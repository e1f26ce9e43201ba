//! Rider-strength heuristics that shrink an oversized candidate set.
//!
//! Strength is one-hour watts per kilogram. Candidates hold duration
//! indices into a sorted list, so comparing indices compares durations.

use paceline_core::Rider;

use super::Candidate;

/// Highest `n` used by [`stronger_than_nth_strongest`] when shrinking.
pub const MAX_STRENGTH_RANK: usize = 12;

/// Rider indices from strongest to weakest. Ties keep rotation order.
pub fn strongest_first(riders: &[Rider]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..riders.len()).collect();
    order.sort_by(|&a, &b| {
        riders[b]
            .power_to_weight()
            .total_cmp(&riders[a].power_to_weight())
    });
    order
}

/// Rider indices from weakest to strongest. Ties keep rotation order.
pub fn weakest_first(riders: &[Rider]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..riders.len()).collect();
    order.sort_by(|&a, &b| {
        riders[a]
            .power_to_weight()
            .total_cmp(&riders[b].power_to_weight())
    });
    order
}

/// Drops sequences where a rider pulls for less time than the weakest rider.
///
/// The second weakest rider is exempt. An empty team drops everything.
pub fn weaker_than_weakest(candidates: &mut Vec<Candidate>, riders: &[Rider]) {
    let order = weakest_first(riders);
    let Some(&weakest) = order.first() else {
        candidates.clear();
        return;
    };
    let exempt = order.get(1).copied();

    candidates.retain(|candidate| {
        let Some(&floor) = candidate.get(weakest) else {
            return false;
        };
        !candidate
            .iter()
            .enumerate()
            .any(|(rider, &duration)| Some(rider) != exempt && duration < floor)
    });
}

/// Drops sequences where a rider outside the strongest `n - 1` pulls longer
/// than the `n`th strongest rider.
///
/// Teams with fewer than `n` riders are left alone; `n == 0` drops everything.
pub fn stronger_than_nth_strongest(candidates: &mut Vec<Candidate>, riders: &[Rider], n: usize) {
    if riders.is_empty() || n == 0 {
        candidates.clear();
        return;
    }
    let order = strongest_first(riders);
    let Some(&nth) = order.get(n - 1) else {
        return;
    };
    let exempt = &order[..n - 1];

    candidates.retain(|candidate| {
        let Some(&ceiling) = candidate.get(nth) else {
            return true;
        };
        !candidate
            .iter()
            .enumerate()
            .any(|(rider, &duration)| !exempt.contains(&rider) && duration > ceiling)
    });
}

/// Applies the heuristics in order until fewer than `max_candidates` remain.
///
/// Nothing is removed unless the set exceeds `max_candidates`. Returns the
/// number of candidates removed.
pub fn shrink(candidates: &mut Vec<Candidate>, riders: &[Rider], max_candidates: usize) -> u64 {
    let before = candidates.len();
    if before <= max_candidates {
        return 0;
    }

    weaker_than_weakest(candidates, riders);
    let mut n = 1;
    while candidates.len() >= max_candidates && n <= MAX_STRENGTH_RANK {
        stronger_than_nth_strongest(candidates, riders, n);
        n += 1;
    }

    (before - candidates.len()) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_test::riders::{five_rider_team, rider};
    use smallvec::smallvec;

    fn all_sequences(riders: usize, durations: usize) -> Vec<Candidate> {
        let mut out = vec![Candidate::new()];
        for _ in 0..riders {
            out = out
                .into_iter()
                .flat_map(|prefix| {
                    (0..durations).map(move |d| {
                        let mut next = prefix.clone();
                        next.push(d);
                        next
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_strength_order() {
        let riders = five_rider_team();
        // erin, dave, alice, carl, bea
        assert_eq!(strongest_first(&riders), vec![4, 3, 0, 2, 1]);
        assert_eq!(weakest_first(&riders), vec![1, 2, 0, 3, 4]);
    }

    #[test]
    fn test_strength_ties_keep_rotation_order() {
        let riders = vec![
            rider("a", 280.0, 70.0),
            rider("b", 280.0, 70.0),
            rider("c", 200.0, 70.0),
        ];
        assert_eq!(strongest_first(&riders), vec![0, 1, 2]);
        assert_eq!(weakest_first(&riders), vec![2, 0, 1]);
    }

    #[test]
    fn test_weaker_than_weakest() {
        let riders = vec![
            rider("strong", 300.0, 70.0),
            rider("weak", 200.0, 70.0),
            rider("middle", 250.0, 70.0),
        ];
        // weakest = 1, second weakest = 2 (exempt)
        let mut candidates: Vec<Candidate> = vec![
            smallvec![1, 1, 0],
            smallvec![0, 1, 0],
            smallvec![1, 0, 0],
            smallvec![2, 1, 2],
        ];
        weaker_than_weakest(&mut candidates, &riders);
        let kept: Vec<&[usize]> = candidates.iter().map(|c| c.as_slice()).collect();
        assert_eq!(kept, vec![&[1, 1, 0][..], &[1, 0, 0][..], &[2, 1, 2][..]]);
    }

    #[test]
    fn test_stronger_than_nth_strongest() {
        let riders = five_rider_team();
        let mut candidates: Vec<Candidate> = vec![
            smallvec![0, 0, 0, 0, 1],
            smallvec![1, 0, 0, 0, 1],
            smallvec![0, 0, 0, 1, 0],
        ];
        // Nobody may pull longer than erin.
        stronger_than_nth_strongest(&mut candidates, &riders, 1);
        assert_eq!(candidates.len(), 2);

        // With erin exempt, nobody may pull longer than dave.
        let mut candidates: Vec<Candidate> = vec![smallvec![0, 0, 0, 0, 1], smallvec![1, 0, 0, 0, 1]];
        stronger_than_nth_strongest(&mut candidates, &riders, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].as_slice(), &[0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_rank_beyond_team_keeps_everything() {
        let riders = five_rider_team();
        let mut candidates = all_sequences(5, 2);
        stronger_than_nth_strongest(&mut candidates, &riders, 6);
        assert_eq!(candidates.len(), 32);
    }

    #[test]
    fn test_shrink_below_threshold_is_noop() {
        let riders = five_rider_team();
        let mut candidates = all_sequences(5, 2);
        assert_eq!(shrink(&mut candidates, &riders, 32), 0);
        assert_eq!(candidates.len(), 32);
    }

    #[test]
    fn test_shrink_stops_once_small_enough() {
        let riders = five_rider_team();
        let mut candidates = all_sequences(5, 3);
        assert_eq!(candidates.len(), 243);

        let removed = shrink(&mut candidates, &riders, 100);
        assert_eq!(removed as usize + candidates.len(), 243);
        assert!(candidates.len() < 100);
        assert!(!candidates.is_empty());
        // The uniform plans survive every heuristic.
        assert!(candidates.iter().any(|c| c.as_slice() == [1, 1, 1, 1, 1]));
    }

    #[test]
    fn test_empty_team() {
        let mut candidates = all_sequences(2, 2);
        weaker_than_weakest(&mut candidates, &[]);
        assert!(candidates.is_empty());
    }
}
