//! Paceline - team time trial pull plans in Rust
//!
//! Give it riders with fitted power curves and it searches every assignment
//! of pull durations for the fastest, most balanced and hardest rotations.
//!
//! # Example
//!
//! ```rust
//! use paceline::prelude::*;
//!
//! let roster = Roster::from_toml_str(r#"
//!     [[riders]]
//!     id = "a"
//!     weight_kg = 75.0
//!     height_cm = 178.0
//!     one_hour_curve = { coefficient = 531.0, exponent = -0.07 }
//!     pull_curve = { coefficient = 627.0, exponent = -0.09 }
//!
//!     [[riders]]
//!     id = "b"
//!     weight_kg = 68.0
//!     height_cm = 172.0
//!     one_hour_curve = { coefficient = 460.0, exponent = -0.07 }
//!     pull_curve = { coefficient = 543.0, exponent = -0.09 }
//! "#).unwrap();
//!
//! let config = PlannerConfig::default().with_pull_durations([30.0, 60.0]);
//! let package = paceline::plan(&config, roster.riders).unwrap();
//!
//! assert!(package.algorithm_ran_to_completion);
//! let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
//! assert_eq!(fastest.rider_count(), 2);
//! ```

// Domain types
pub use paceline_core::{
    CriticalPowerFit, CurveFit, Gender, PacelineComputationReport, PacelineError,
    PacelineIngredients, PlanCategory, PowerCurve, Result, Rider, RiderContribution,
    RiderExertion, RiderWorkAssignment,
};

// Numeric models
pub use paceline_core::{physics, power_curve};

// Configuration and rider repository
pub use paceline_config::{ConfigError, PlannerConfig, Roster};

// Engine
pub use paceline_solver::{
    PacelineSolutionsPackage, PlanSearchEngine, SearchStatistics, SpeedBound,
};

// Lower-level building blocks
pub use paceline_solver::{bounds, checker, simulator};

#[cfg(feature = "console")]
pub use paceline_console as console;

/// Searches every named plan for `ingredients` with the default configuration.
///
/// With the `console` feature enabled, console output is initialized on
/// first use.
pub fn generate_plan_package(ingredients: &PacelineIngredients) -> Result<PacelineSolutionsPackage> {
    init_console();
    paceline_solver::generate_plan_package(ingredients)
}

/// Fastest plan for the `n` strongest riders by power-to-weight ratio.
pub fn generate_fastest_for_n_strongest(
    ingredients: &PacelineIngredients,
    n: usize,
) -> Result<PacelineComputationReport> {
    init_console();
    paceline_solver::generate_fastest_for_n_strongest(ingredients, n)
}

/// Plans for `riders` using every setting in `config`.
///
/// # Errors
///
/// [`PacelineError::InvalidInput`] when `config` fails
/// [`PlannerConfig::validate`], before any search runs. Otherwise as for
/// [`PlanSearchEngine::generate_plan_package`].
pub fn plan(config: &PlannerConfig, riders: Vec<Rider>) -> Result<PacelineSolutionsPackage> {
    config
        .validate()
        .map_err(|e| PacelineError::InvalidInput(e.to_string()))?;
    init_console();
    let ingredients = config.ingredients(riders);
    PlanSearchEngine::from_config(config.clone()).generate_plan_package(&ingredients)
}

#[inline]
fn init_console() {
    #[cfg(feature = "console")]
    paceline_console::init();
}

pub mod prelude {
    pub use super::{
        PacelineComputationReport, PacelineIngredients, PacelineSolutionsPackage, PlanCategory,
        PlanSearchEngine, PlannerConfig, PowerCurve, Rider, Roster,
    };
}
