//! Configuration system for paceline planning.
//!
//! Load planner settings and rider rosters from TOML or YAML files so that
//! ceilings, candidate pull durations and search behaviour can change
//! without code changes.
//!
//! # Examples
//!
//! Load configuration from a TOML string:
//!
//! ```
//! use paceline_config::{EvaluationStrategy, PlannerConfig, ThreadCount};
//!
//! let config = PlannerConfig::from_toml_str(r#"
//!     max_intensity_factor = 1.0
//!     pull_durations = [30, 60, 120]
//!
//!     [speed_search]
//!     tolerance_kph = 0.05
//!
//!     [search]
//!     thread_count = { specific = 4 }
//!     [search.strategy]
//!     type = "chunked"
//!     chunk_size = 32
//! "#).unwrap();
//!
//! assert_eq!(config.pull_durations, vec![30.0, 60.0, 120.0]);
//! assert_eq!(config.search.thread_count, ThreadCount::Specific(4));
//! assert_eq!(config.search.strategy, EvaluationStrategy::Chunked { chunk_size: 32 });
//! ```
//!
//! Use default config when the file is missing:
//!
//! ```
//! use paceline_config::PlannerConfig;
//!
//! let config = PlannerConfig::load("planner.toml").unwrap_or_default();
//! assert_eq!(config.search.parallel_threshold, 512);
//! ```

mod roster;

pub use roster::Roster;

use std::fmt;
use std::path::Path;

use paceline_core::{PacelineIngredients, Rider};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Standard candidate pull durations in seconds.
pub const DEFAULT_PULL_DURATIONS: [f64; 5] = [30.0, 60.0, 120.0, 180.0, 240.0];

/// Main planner configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PlannerConfig {
    /// Ceiling on normalized power over one-hour power for every rider.
    pub max_intensity_factor: f64,

    /// Candidate pull durations in seconds.
    pub pull_durations: Vec<f64>,

    /// Starting speed for the search. Derived from speed bounds when absent.
    pub seed_speed_kph: Option<f64>,

    /// Per-sequence speed search settings.
    pub speed_search: SpeedSearchConfig,

    /// Candidate enumeration and evaluation settings.
    pub search: SearchConfig,

    /// Plan selection settings.
    pub selection: SelectionConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_intensity_factor: 0.95,
            pull_durations: DEFAULT_PULL_DURATIONS.to_vec(),
            seed_speed_kph: None,
            speed_search: SpeedSearchConfig::default(),
            search: SearchConfig::default(),
            selection: SelectionConfig::default(),
        }
    }
}

impl PlannerConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the intensity factor ceiling.
    pub fn with_max_intensity_factor(mut self, ceiling: f64) -> Self {
        self.max_intensity_factor = ceiling;
        self
    }

    /// Sets the candidate pull durations.
    pub fn with_pull_durations(mut self, durations: impl Into<Vec<f64>>) -> Self {
        self.pull_durations = durations.into();
        self
    }

    /// Sets the seed speed.
    pub fn with_seed_speed(mut self, kph: f64) -> Self {
        self.seed_speed_kph = Some(kph);
        self
    }

    /// Sets the evaluation thread count.
    pub fn with_thread_count(mut self, thread_count: ThreadCount) -> Self {
        self.search.thread_count = thread_count;
        self
    }

    /// Sets the evaluation strategy.
    pub fn with_strategy(mut self, strategy: EvaluationStrategy) -> Self {
        self.search.strategy = strategy;
        self
    }

    /// Sets the candidate count above which evaluation goes parallel.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.search.parallel_threshold = threshold;
        self
    }

    /// Checks value ranges the planner relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_intensity_factor.is_finite() || self.max_intensity_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max_intensity_factor must be positive, got {}",
                self.max_intensity_factor
            )));
        }
        if self.pull_durations.iter().any(|d| !d.is_finite() || *d < 0.0) {
            return Err(ConfigError::Invalid(
                "pull_durations must be non-negative".to_string(),
            ));
        }
        if !self.pull_durations.iter().any(|d| *d > 0.0) {
            return Err(ConfigError::Invalid(
                "pull_durations needs at least one positive duration".to_string(),
            ));
        }
        if let Some(seed) = self.seed_speed_kph {
            if !seed.is_finite() || seed <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "seed_speed_kph must be positive, got {seed}"
                )));
            }
        }
        self.speed_search.validate()?;
        self.search.validate()?;
        if !self.selection.balance_speed_tolerance_kph.is_finite()
            || self.selection.balance_speed_tolerance_kph < 0.0
        {
            return Err(ConfigError::Invalid(
                "selection.balance_speed_tolerance_kph must be non-negative".to_string(),
            ));
        }
        Ok(())
    }

    /// Bundles riders with these settings into a planning request.
    pub fn ingredients(&self, riders: Vec<Rider>) -> PacelineIngredients {
        PacelineIngredients {
            riders,
            seed_speed_kph: self.seed_speed_kph,
            pull_durations: self.pull_durations.clone(),
            max_intensity_factor: self.max_intensity_factor,
        }
    }
}

/// Speed search settings for a single duration sequence.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SpeedSearchConfig {
    /// Step used while walking up from the seed speed.
    pub increment_kph: f64,

    /// Width of the final feasible/infeasible interval.
    pub tolerance_kph: f64,

    /// Hard ceiling on evaluations per search.
    pub max_iterations: u64,
}

impl Default for SpeedSearchConfig {
    fn default() -> Self {
        Self {
            increment_kph: 1.0,
            tolerance_kph: 0.01,
            max_iterations: 200,
        }
    }
}

impl SpeedSearchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.increment_kph.is_finite() || self.increment_kph <= 0.0 {
            return Err(ConfigError::Invalid(
                "speed_search.increment_kph must be positive".to_string(),
            ));
        }
        if !self.tolerance_kph.is_finite() || self.tolerance_kph <= 0.0 {
            return Err(ConfigError::Invalid(
                "speed_search.tolerance_kph must be positive".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "speed_search.max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Candidate enumeration and evaluation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchConfig {
    /// Worker threads for candidate evaluation.
    pub thread_count: ThreadCount,

    /// Below this many candidates evaluation stays on the calling thread.
    pub parallel_threshold: usize,

    /// How candidates are dispatched to workers.
    pub strategy: EvaluationStrategy,

    /// Candidate count above which heuristic filters are applied.
    pub max_candidates: usize,

    /// Maximum branch-and-bound node expansions (None = unlimited).
    pub node_limit: Option<u64>,

    /// Order in which the candidate tree is explored.
    pub exploration: ExplorationType,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            thread_count: ThreadCount::Auto,
            parallel_threshold: 512,
            strategy: EvaluationStrategy::PerSequence,
            max_candidates: 1024,
            node_limit: None,
            exploration: ExplorationType::DepthFirst,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == ThreadCount::Specific(0) {
            return Err(ConfigError::Invalid(
                "search.thread_count must be at least 1".to_string(),
            ));
        }
        if let EvaluationStrategy::Chunked { chunk_size: 0 } = self.strategy {
            return Err(ConfigError::Invalid(
                "search.strategy.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::Invalid(
                "search.max_candidates must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Worker thread count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadCount {
    /// One thread per CPU, but never more than there is work.
    #[default]
    Auto,
    /// One thread per CPU.
    Unlimited,
    /// A specific number of threads, capped by the amount of work.
    Specific(usize),
}

impl ThreadCount {
    /// Resolves to an actual thread count for `work_items` units of work.
    pub fn resolve(&self, work_items: usize) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        let threads = match self {
            ThreadCount::Auto => cpus.min(work_items),
            ThreadCount::Unlimited => cpus,
            ThreadCount::Specific(n) => (*n).min(work_items),
        };
        threads.max(1)
    }
}

impl fmt::Display for ThreadCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadCount::Auto => write!(f, "Auto"),
            ThreadCount::Unlimited => write!(f, "Unlimited"),
            ThreadCount::Specific(n) => write!(f, "{}", n),
        }
    }
}

/// How candidate sequences are handed to workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvaluationStrategy {
    /// One candidate per dispatch.
    #[default]
    PerSequence,

    /// `chunk_size` candidates per dispatch.
    Chunked { chunk_size: usize },
}

impl fmt::Display for EvaluationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationStrategy::PerSequence => write!(f, "PerSequence"),
            EvaluationStrategy::Chunked { chunk_size } => write!(f, "Chunked({})", chunk_size),
        }
    }
}

/// Exploration order for the candidate tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationType {
    /// Extend the most recent partial sequence first.
    #[default]
    DepthFirst,
    /// Extend all sequences of one length before the next.
    BreadthFirst,
}

impl fmt::Display for ExplorationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorationType::DepthFirst => write!(f, "DepthFirst"),
            ExplorationType::BreadthFirst => write!(f, "BreadthFirst"),
        }
    }
}

/// Plan selection settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SelectionConfig {
    /// Balanced plans must be within this many kph of the fastest plan.
    pub balance_speed_tolerance_kph: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            balance_speed_tolerance_kph: 1.0,
        }
    }
}
