//! Candidate generation, evaluation and plan selection.
//!
//! A candidate assigns each rider, in rotation order, an index into the
//! request's sorted list of distinct pull durations. The space has
//! `d^n` members for `n` riders and `d` durations.
//!
//! # Pipeline
//!
//! 1. [`Enumerator`] walks the assignment tree, pruning branches whose
//!    [`PullLimits`] and [`IntensityLimits`] bound falls below the cutoff
//!    speed
//! 2. [`filter::shrink`] cuts an oversized result down with rider-strength
//!    heuristics
//! 3. [`evaluate_candidates`] runs the speed search per candidate
//! 4. [`select`] picks the named plans

pub mod enumerate;
pub mod evaluate;
pub mod filter;
pub mod limits;
pub mod node;
pub mod select;

use smallvec::SmallVec;

pub use enumerate::{Enumeration, Enumerator};
pub use evaluate::{evaluate_candidates, evaluate_sequence, Evaluation, EvaluationContext};
pub use limits::{IntensityLimits, PullLimits};
pub use node::{SequenceArena, SequenceNode};

/// Duration indices, one per rider.
pub type Candidate = SmallVec<[usize; 8]>;
