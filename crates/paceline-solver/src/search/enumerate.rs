//! Branch-and-bound enumeration of duration sequences.

use std::collections::VecDeque;

use paceline_config::ExplorationType;

use super::limits::{IntensityLimits, PullLimits};
use super::node::{SequenceArena, SequenceNode};
use super::Candidate;

/// Sequences that survived enumeration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enumeration {
    /// Complete sequences in lexicographic order of duration index.
    pub candidates: Vec<Candidate>,
    /// Nodes expanded.
    pub nodes_expanded: u64,
    /// Complete sequences cut off, counting every leaf below a pruned node.
    pub sequences_pruned: u64,
    pub node_limit_reached: bool,
}

/// Walks the tree of duration assignments, one rider per level.
///
/// A child is pruned when its optimistic speed falls below the cutoff. The
/// optimistic speed is the lowest [`PullLimits`] entry along the path and,
/// with [`with_intensity_limits`](Self::with_intensity_limits), the
/// [`IntensityLimits`] cap of the partial sequence. A complete sequence in
/// which nobody pulls is pruned as well.
#[derive(Debug, Clone)]
pub struct Enumerator<'a> {
    limits: &'a PullLimits,
    intensity: Option<&'a IntensityLimits>,
    cutoff_speed_kph: f64,
    exploration: ExplorationType,
    node_limit: Option<u64>,
}

impl<'a> Enumerator<'a> {
    pub fn new(limits: &'a PullLimits, cutoff_speed_kph: f64) -> Self {
        Self {
            limits,
            intensity: None,
            cutoff_speed_kph,
            exploration: ExplorationType::DepthFirst,
            node_limit: None,
        }
    }

    pub fn with_intensity_limits(mut self, intensity: &'a IntensityLimits) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_exploration(mut self, exploration: ExplorationType) -> Self {
        self.exploration = exploration;
        self
    }

    pub fn with_node_limit(mut self, node_limit: Option<u64>) -> Self {
        self.node_limit = node_limit;
        self
    }

    pub fn run(&self) -> Enumeration {
        let rider_count = self.limits.rider_count();
        let durations = self.limits.durations();
        let mut result = Enumeration::default();
        if rider_count == 0 || durations.is_empty() {
            return result;
        }

        let mut arena = SequenceArena::new();
        let mut frontier = VecDeque::new();
        frontier.push_back(arena.push(SequenceNode::root()));

        while let Some(index) = self.next(&mut frontier) {
            let Some(node) = arena.get(index).copied() else {
                continue;
            };

            if node.is_leaf(rider_count) {
                if node.has_pull() {
                    result.candidates.push(arena.candidate(index));
                } else {
                    result.sequences_pruned += 1;
                }
                continue;
            }

            if let Some(limit) = self.node_limit {
                if result.nodes_expanded >= limit {
                    result.node_limit_reached = true;
                    break;
                }
            }
            result.nodes_expanded += 1;

            let rider = node.depth();
            let leaves_below = subtree_leaves(durations.len(), rider_count - rider - 1);
            let mut path = arena.candidate(index);
            for (duration_index, &duration) in durations.iter().enumerate() {
                let mut bound = node
                    .optimistic_speed_kph()
                    .min(self.limits.speed_limit(rider, duration_index));
                if let Some(intensity) = self.intensity {
                    path.push(duration_index);
                    bound = bound.min(intensity.speed_limit(&path));
                    path.pop();
                }
                let child = SequenceNode::child(
                    index,
                    rider + 1,
                    duration_index,
                    bound,
                    node.has_pull() || duration > 0.0,
                );
                if child.can_prune(self.cutoff_speed_kph) {
                    result.sequences_pruned = result.sequences_pruned.saturating_add(leaves_below);
                    continue;
                }
                frontier.push_back(arena.push(child));
            }
        }

        result.candidates.sort_unstable();
        result
    }

    fn next(&self, frontier: &mut VecDeque<usize>) -> Option<usize> {
        match self.exploration {
            ExplorationType::DepthFirst => frontier.pop_back(),
            ExplorationType::BreadthFirst => frontier.pop_front(),
        }
    }
}

fn subtree_leaves(branching: usize, levels: usize) -> u64 {
    (branching as u64).saturating_pow(levels.min(u32::MAX as usize) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_test::riders::{rider, three_rider_team};

    #[test]
    fn test_full_space_without_pruning() {
        let riders = three_rider_team();
        let limits = PullLimits::new(&riders, &[30.0, 60.0]);
        let result = Enumerator::new(&limits, 0.0).run();

        assert_eq!(result.candidates.len(), 8);
        assert_eq!(result.sequences_pruned, 0);
        assert_eq!(result.candidates[0].as_slice(), &[0, 0, 0]);
        assert_eq!(result.candidates[7].as_slice(), &[1, 1, 1]);
        // Root plus one level of 2 plus one of 4.
        assert_eq!(result.nodes_expanded, 7);
    }

    #[test]
    fn test_exploration_order_does_not_change_result() {
        let riders = three_rider_team();
        let limits = PullLimits::new(&riders, &[30.0, 60.0, 120.0]);
        let depth = Enumerator::new(&limits, 39.0).run();
        let breadth = Enumerator::new(&limits, 39.0)
            .with_exploration(ExplorationType::BreadthFirst)
            .run();
        assert_eq!(depth, breadth);
        assert_eq!(depth.candidates.len(), 27);
    }

    #[test]
    fn test_pull_limit_prunes() {
        let riders = three_rider_team();
        let limits = PullLimits::new(&riders, &[30.0, 240.0]);
        // Chloe's 240 s limit is about 41.4 kph, everybody else is above 42.
        let result = Enumerator::new(&limits, 42.0).run();

        assert_eq!(result.candidates.len(), 4);
        assert_eq!(result.sequences_pruned, 4);
        assert!(result.candidates.iter().all(|c| c[2] == 0));
    }

    #[test]
    fn test_intensity_limit_prunes_more() {
        let riders = three_rider_team();
        let durations = [30.0, 60.0, 120.0, 180.0, 240.0];
        let limits = PullLimits::new(&riders, &durations);
        let intensity = IntensityLimits::new(&riders, &durations, 1.0);

        let pull_only = Enumerator::new(&limits, 41.82).run();
        let both = Enumerator::new(&limits, 41.82)
            .with_intensity_limits(&intensity)
            .run();

        assert!(both.sequences_pruned > pull_only.sequences_pruned);
        assert_eq!(
            both.candidates.len() as u64 + both.sequences_pruned,
            125
        );
        assert!(both
            .candidates
            .iter()
            .all(|c| pull_only.candidates.contains(c)));
        // The fastest sequence at this ceiling survives.
        assert!(both.candidates.iter().any(|c| c.as_slice() == [1, 1, 0]));
    }

    #[test]
    fn test_nobody_pulls_is_pruned() {
        let riders = vec![rider("a", 250.0, 70.0), rider("b", 260.0, 72.0)];
        let limits = PullLimits::new(&riders, &[0.0, 30.0]);
        let result = Enumerator::new(&limits, 0.0).run();
        assert_eq!(result.candidates.len(), 3);
        assert_eq!(result.sequences_pruned, 1);
        assert!(!result.candidates.iter().any(|c| c.as_slice() == [0, 0]));
    }

    #[test]
    fn test_node_limit() {
        let riders = three_rider_team();
        let limits = PullLimits::new(&riders, &[30.0, 60.0]);
        let result = Enumerator::new(&limits, 0.0)
            .with_node_limit(Some(2))
            .run();
        assert!(result.node_limit_reached);
        assert_eq!(result.nodes_expanded, 2);
        assert!(result.candidates.len() < 8);
    }

    #[test]
    fn test_empty_inputs() {
        let limits = PullLimits::new(&[], &[30.0]);
        let result = Enumerator::new(&limits, 0.0).run();
        assert!(result.candidates.is_empty());
        assert_eq!(result.nodes_expanded, 0);
    }
}
