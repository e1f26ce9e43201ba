//! Paceline plan search engine.
//!
//! This crate provides:
//! - Rotation workload simulation ([`simulator`])
//! - Exertion aggregation and limit checks ([`checker`])
//! - Speed bounds and the maximum feasible speed search ([`bounds`])
//! - Candidate enumeration, evaluation and selection ([`search`])
//! - The engine tying them together ([`PlanSearchEngine`])
//! - Search statistics ([`statistics`])

pub mod bounds;
pub mod checker;
pub mod engine;
pub mod package;
pub mod search;
pub mod simulator;
pub mod statistics;

pub use bounds::{
    find_max_feasible_speed, lower_bound, lower_bound_one_hour, safe_seed_speed,
    search_max_feasible_speed, upper_bound, upper_bound_one_hour, SpeedBound,
    SpeedSearchOutcome,
};
pub use engine::{generate_fastest_for_n_strongest, generate_plan_package, PlanSearchEngine};
pub use package::PacelineSolutionsPackage;
pub use search::{Candidate, IntensityLimits, PullLimits};
pub use statistics::{PhaseStatistics, SearchStatistics, StatisticsCollector};
