//! Partial duration sequences stored in an index arena.

use super::Candidate;

/// A node in the sequence tree.
///
/// A node at depth `k` has assigned pull durations to the first `k` riders.
/// Parents are referenced by index into the owning [`SequenceArena`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceNode {
    depth: usize,

    /// Index into the distinct duration list assigned to rider `depth - 1`.
    duration_index: Option<usize>,

    parent_index: Option<usize>,

    /// Speed no completion of this partial sequence can reach: the lowest
    /// pull limit among the riders assigned so far, capped by the intensity
    /// limit when one is in use.
    optimistic_speed_kph: f64,

    /// Whether any assigned rider pulls for a positive duration.
    has_pull: bool,
}

impl SequenceNode {
    /// The empty sequence.
    pub fn root() -> Self {
        Self {
            depth: 0,
            duration_index: None,
            parent_index: None,
            optimistic_speed_kph: f64::INFINITY,
            has_pull: false,
        }
    }

    pub fn child(
        parent_index: usize,
        depth: usize,
        duration_index: usize,
        optimistic_speed_kph: f64,
        has_pull: bool,
    ) -> Self {
        Self {
            depth,
            duration_index: Some(duration_index),
            parent_index: Some(parent_index),
            optimistic_speed_kph,
            has_pull,
        }
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn duration_index(&self) -> Option<usize> {
        self.duration_index
    }

    #[inline]
    pub fn parent_index(&self) -> Option<usize> {
        self.parent_index
    }

    #[inline]
    pub fn optimistic_speed_kph(&self) -> f64 {
        self.optimistic_speed_kph
    }

    #[inline]
    pub fn has_pull(&self) -> bool {
        self.has_pull
    }

    /// Every rider has a duration.
    pub fn is_leaf(&self, rider_count: usize) -> bool {
        self.depth >= rider_count
    }

    /// True when no completion can reach `cutoff_speed_kph`.
    pub fn can_prune(&self, cutoff_speed_kph: f64) -> bool {
        self.optimistic_speed_kph < cutoff_speed_kph
    }
}

/// Owns every node created during one enumeration.
#[derive(Debug, Default)]
pub struct SequenceArena {
    nodes: Vec<SequenceNode>,
}

impl SequenceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Stores a node and returns its index.
    pub fn push(&mut self, node: SequenceNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&SequenceNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Duration indices from the root down to `index`.
    pub fn candidate(&self, index: usize) -> Candidate {
        let mut candidate = Candidate::new();
        let mut cursor = Some(index);
        while let Some(node) = cursor.and_then(|i| self.nodes.get(i)) {
            if let Some(duration_index) = node.duration_index {
                candidate.push(duration_index);
            }
            cursor = node.parent_index;
        }
        candidate.reverse();
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root() {
        let root = SequenceNode::root();
        assert_eq!(root.depth(), 0);
        assert!(root.parent_index().is_none());
        assert!(!root.has_pull());
        assert!(!root.can_prune(40.0));
        assert!(root.is_leaf(0));
        assert!(!root.is_leaf(3));
    }

    #[test]
    fn test_can_prune() {
        let node = SequenceNode::child(0, 1, 2, 38.5, true);
        assert!(node.can_prune(39.0));
        assert!(!node.can_prune(38.5));
    }

    #[test]
    fn test_candidate_path() {
        let mut arena = SequenceArena::new();
        let root = arena.push(SequenceNode::root());
        let a = arena.push(SequenceNode::child(root, 1, 1, 45.0, true));
        let b = arena.push(SequenceNode::child(a, 2, 0, 44.0, true));
        let c = arena.push(SequenceNode::child(b, 3, 2, 43.0, true));
        let other = arena.push(SequenceNode::child(a, 2, 2, 43.5, true));

        assert_eq!(arena.len(), 5);
        assert_eq!(arena.candidate(c).as_slice(), &[1, 0, 2]);
        assert_eq!(arena.candidate(other).as_slice(), &[1, 2]);
        assert!(arena.candidate(root).is_empty());
    }
}
