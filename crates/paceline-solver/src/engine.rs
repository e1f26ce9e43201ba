//! The plan search engine.
//!
//! One request runs four phases: seed, enumerate, evaluate and select.
//! Every phase logs a `phase_end` event and records its timing into the
//! request's [`StatisticsCollector`].
//!
//! Enumeration prunes against an incumbent. Before the tree walk every
//! sequence in which all riders pull for the same positive duration is
//! evaluated. The fastest of them survives enumeration and filtering, so its
//! speed is one the final candidate set reaches. Branches whose optimistic
//! speed falls below that incumbent, less the balance tolerance, cannot
//! supply the fastest or the balanced plan and are cut. The
//! everybody-pulls-hard plan is picked among the survivors.

use std::collections::BTreeMap;
use std::time::Instant;

use paceline_config::PlannerConfig;
use paceline_core::{
    PacelineComputationReport, PacelineIngredients, PlanCategory, Result, Rider,
};
use tracing::{debug, info, trace, warn};

use crate::bounds::safe_seed_speed;
use crate::package::PacelineSolutionsPackage;
use crate::search::{
    evaluate_candidates, evaluate_sequence, filter, select, Enumerator, EvaluationContext,
    IntensityLimits, PullLimits,
};
use crate::statistics::{SearchStatistics, StatisticsCollector};

/// Baseline plans in which every rider pulls for the same time.
const BASELINES: [(PlanCategory, f64); 2] = [
    (PlanCategory::ThirtySecondPull, 30.0),
    (PlanCategory::SixtySecondPull, 60.0),
];

/// Searches duration sequences for the fastest, most balanced and hardest
/// paceline plans.
///
/// The engine holds only configuration. Everything a request needs is
/// built per call and dropped with it, so one engine can serve concurrent
/// requests.
///
/// ```
/// use paceline_config::PlannerConfig;
/// use paceline_core::{PacelineIngredients, PlanCategory, PowerCurve, Rider};
/// use paceline_solver::PlanSearchEngine;
///
/// let rider = |id: &str, watts: f64, kg: f64| {
///     Rider::new(id, kg, 175.0)
///         .with_one_hour_curve(PowerCurve::through(watts, 3600.0, -0.07).unwrap())
///         .with_pull_curve(PowerCurve::through(watts, 3600.0, -0.09).unwrap())
/// };
/// let riders = vec![rider("a", 300.0, 75.0), rider("b", 260.0, 68.0)];
///
/// let engine = PlanSearchEngine::from_config(PlannerConfig::default());
/// let package = engine
///     .generate_plan_package(&PacelineIngredients::new(riders, vec![30.0, 60.0], 0.95))
///     .unwrap();
///
/// assert!(package.algorithm_ran_to_completion);
/// assert!(package.get(PlanCategory::FastestFullTeam).unwrap().speed_kph > 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanSearchEngine {
    config: PlannerConfig,
}

// Searchable riders and the speeds derived from them.
struct Prepared {
    riders: Vec<Rider>,
    durations: Vec<f64>,
    max_intensity_factor: f64,
    start_speed_kph: f64,
    floor_speed_kph: f64,
}

impl PlanSearchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Runs the full search and returns every named plan.
    ///
    /// Teams of fewer than two searchable riders, or constraints nobody can
    /// meet, produce a package with `algorithm_ran_to_completion == false`.
    /// Last-five and last-four plans are present only for teams larger than
    /// five and four riders.
    ///
    /// # Errors
    ///
    /// Invalid ingredients or rider data. Failures local to one candidate
    /// are counted in the statistics and skipped.
    pub fn generate_plan_package(
        &self,
        ingredients: &PacelineIngredients,
    ) -> Result<PacelineSolutionsPackage> {
        let collector = StatisticsCollector::new();
        info!(
            event = "plan_search_start",
            rider_count = ingredients.riders.len(),
            duration_count = ingredients.pull_durations.len(),
            max_intensity_factor = ingredients.max_intensity_factor,
        );

        let Some(prepared) = self.prepare(ingredients, &collector)? else {
            let statistics = collector.into_statistics();
            log_search_end(&statistics, false);
            return Ok(PacelineSolutionsPackage::incomplete(
                &ingredients.pull_durations,
                statistics,
            ));
        };

        let mut reports = BTreeMap::new();
        for (category, pull_secs) in BASELINES {
            let durations = vec![pull_secs; prepared.riders.len()];
            reports.insert(category, self.evaluate_fixed(&prepared, durations, &collector)?);
        }

        let tolerance = self.config.selection.balance_speed_tolerance_kph;
        let candidates = self.explore(&prepared, &collector, tolerance)?;

        let started = Instant::now();
        let picks = [
            (PlanCategory::FastestFullTeam, select::fastest(&candidates)),
            (
                PlanCategory::BalancedIntensity,
                select::balanced(&candidates, tolerance),
            ),
            (PlanCategory::EverybodyPullsHard, select::hardest(&candidates)),
        ];
        let completed = !candidates.is_empty();
        for (category, pick) in picks {
            let report = pick
                .and_then(|index| candidates.get(index).cloned())
                .unwrap_or_else(|| {
                    PacelineComputationReport::incomplete(ingredients.pull_durations.clone(), 0)
                });
            reports.insert(category, report);
        }
        collector.record_phase("select", started.elapsed(), candidates.len() as u64);
        info!(
            event = "phase_end",
            phase = "select",
            duration_ms = started.elapsed().as_millis() as u64,
            reports = candidates.len(),
        );

        let mut nested = Vec::new();
        for category in [PlanCategory::FastestLastFive, PlanCategory::FastestLastFour] {
            let Some(n) = category.strongest_riders() else {
                continue;
            };
            if prepared.riders.len() <= n {
                continue;
            }
            let subset = PacelineIngredients {
                riders: prepared.riders.clone(),
                ..ingredients.clone()
            }
            .with_n_strongest(n);
            let (report, statistics) = self.fastest_with_statistics(&subset)?;
            reports.insert(category, report);
            nested.push(statistics);
        }

        for (category, report) in &reports {
            info!(
                event = "plan_selected",
                category = %category,
                speed_kph = report.speed_kph,
                dispersion = report.intensity_dispersion,
                completed = report.algorithm_ran_to_completion,
            );
        }

        let mut statistics = collector.into_statistics();
        for inner in &nested {
            statistics.absorb(inner);
        }
        log_search_end(&statistics, completed);

        Ok(PacelineSolutionsPackage {
            reports,
            statistics,
            algorithm_ran_to_completion: completed,
        })
    }

    /// Fastest plan for the `n` strongest riders by power-to-weight ratio,
    /// ridden in their original rotation order.
    ///
    /// # Errors
    ///
    /// As for [`generate_plan_package`](Self::generate_plan_package).
    pub fn generate_fastest_for_n_strongest(
        &self,
        ingredients: &PacelineIngredients,
        n: usize,
    ) -> Result<PacelineComputationReport> {
        let searchable = PacelineIngredients {
            riders: ingredients
                .riders
                .iter()
                .filter(|r| r.is_searchable())
                .cloned()
                .collect(),
            ..ingredients.clone()
        };
        let (report, statistics) =
            self.fastest_with_statistics(&searchable.with_n_strongest(n))?;
        log_search_end(&statistics, report.algorithm_ran_to_completion);
        Ok(report)
    }

    fn fastest_with_statistics(
        &self,
        ingredients: &PacelineIngredients,
    ) -> Result<(PacelineComputationReport, SearchStatistics)> {
        let collector = StatisticsCollector::new();
        let report = match self.prepare(ingredients, &collector)? {
            Some(prepared) => {
                let candidates = self.explore(&prepared, &collector, 0.0)?;
                select::fastest(&candidates).and_then(|index| candidates.into_iter().nth(index))
            }
            None => None,
        };
        let report = report.unwrap_or_else(|| {
            PacelineComputationReport::incomplete(ingredients.pull_durations.clone(), 0)
        });
        Ok((report, collector.into_statistics()))
    }

    // Validates the request and derives the seed and floor speeds.
    fn prepare(
        &self,
        ingredients: &PacelineIngredients,
        collector: &StatisticsCollector,
    ) -> Result<Option<Prepared>> {
        ingredients.validate()?;
        let started = Instant::now();

        let riders: Vec<Rider> = ingredients
            .riders
            .iter()
            .filter(|r| r.is_searchable())
            .cloned()
            .collect();
        let skipped = ingredients.riders.len() - riders.len();
        if skipped > 0 {
            warn!(
                event = "riders_skipped",
                skipped = skipped,
                "Riders without fitted power curves are left out"
            );
        }
        if riders.len() < 2 {
            debug!(
                event = "search_skipped",
                rider_count = riders.len(),
                "Fewer than two searchable riders"
            );
            return Ok(None);
        }

        let Some(floor_speed_kph) = safe_seed_speed(&riders)? else {
            return Ok(None);
        };
        let start_speed_kph = ingredients
            .seed_speed_kph
            .filter(|kph| kph.is_finite() && *kph > 0.0)
            .unwrap_or(floor_speed_kph);

        collector.record_phase("seed", started.elapsed(), 1);
        info!(
            event = "phase_end",
            phase = "seed",
            duration_ms = started.elapsed().as_millis() as u64,
            start_speed_kph = start_speed_kph,
            floor_speed_kph = floor_speed_kph,
        );

        Ok(Some(Prepared {
            riders,
            durations: ingredients.distinct_pull_durations(),
            max_intensity_factor: ingredients.max_intensity_factor,
            start_speed_kph,
            floor_speed_kph,
        }))
    }

    // Enumerates, filters and evaluates every candidate sequence. Sequences
    // that cannot come within `tolerance_kph` of the incumbent are pruned.
    fn explore(
        &self,
        prepared: &Prepared,
        collector: &StatisticsCollector,
        tolerance_kph: f64,
    ) -> Result<Vec<PacelineComputationReport>> {
        let search = &self.config.search;

        let started = Instant::now();
        let cutoff_speed_kph = match self.incumbent_speed(prepared, collector)? {
            Some(kph) => (kph - tolerance_kph.max(0.0)).max(prepared.floor_speed_kph),
            None => prepared.floor_speed_kph,
        };
        let limits = PullLimits::new(&prepared.riders, &prepared.durations);
        let intensity = IntensityLimits::new(
            &prepared.riders,
            &prepared.durations,
            prepared.max_intensity_factor,
        );
        let enumeration = Enumerator::new(&limits, cutoff_speed_kph)
            .with_intensity_limits(&intensity)
            .with_exploration(search.exploration)
            .with_node_limit(search.node_limit)
            .run();
        collector.record_pruned(enumeration.sequences_pruned);
        if enumeration.node_limit_reached {
            collector.record_node_limit_reached();
            warn!(
                event = "node_limit_reached",
                nodes = enumeration.nodes_expanded,
                "Enumeration stopped early"
            );
        }

        let mut candidates = enumeration.candidates;
        let filtered = filter::shrink(&mut candidates, &prepared.riders, search.max_candidates);
        collector.record_filtered(filtered);
        collector.record_phase("enumerate", started.elapsed(), candidates.len() as u64);
        info!(
            event = "phase_end",
            phase = "enumerate",
            duration_ms = started.elapsed().as_millis() as u64,
            nodes = enumeration.nodes_expanded,
            candidates = candidates.len(),
            pruned = enumeration.sequences_pruned,
            filtered = filtered,
            cutoff_speed_kph = cutoff_speed_kph,
        );

        let started = Instant::now();
        let context = EvaluationContext {
            riders: &prepared.riders,
            durations: &prepared.durations,
            max_intensity_factor: prepared.max_intensity_factor,
            start_speed_kph: prepared.start_speed_kph,
            speed_search: &self.config.speed_search,
        };
        let evaluation = evaluate_candidates(&context, &candidates, search)?;
        collector.record_examined(candidates.len() as u64);
        collector.record_failures(evaluation.failures);
        collector.record_iterations(evaluation.compute_iterations);
        collector.record_phase(
            "evaluate",
            started.elapsed(),
            evaluation.reports.len() as u64,
        );
        info!(
            event = "phase_end",
            phase = "evaluate",
            duration_ms = started.elapsed().as_millis() as u64,
            feasible = evaluation.reports.len(),
            failures = evaluation.failures,
            iterations = evaluation.compute_iterations,
            threads = evaluation.threads,
        );

        Ok(evaluation.reports)
    }

    // Fastest sequence in which every rider pulls for the same positive
    // duration. These runs are not counted as examined; the same sequences
    // are evaluated again as candidates.
    fn incumbent_speed(
        &self,
        prepared: &Prepared,
        collector: &StatisticsCollector,
    ) -> Result<Option<f64>> {
        let mut best: Option<f64> = None;
        for &duration in prepared.durations.iter().filter(|&&d| d > 0.0) {
            let durations = vec![duration; prepared.riders.len()];
            match evaluate_sequence(
                &prepared.riders,
                &durations,
                prepared.max_intensity_factor,
                prepared.start_speed_kph,
                &self.config.speed_search,
            ) {
                Ok(report) => {
                    collector.record_iterations(report.compute_iterations);
                    best = Some(best.map_or(report.speed_kph, |kph| kph.max(report.speed_kph)));
                }
                Err(e) if e.is_candidate_local() => {
                    trace!(event = "incumbent_skipped", duration = duration, reason = %e);
                }
                Err(e) => return Err(e),
            }
        }
        debug!(event = "incumbent", speed_kph = best.unwrap_or(0.0));
        Ok(best)
    }

    fn evaluate_fixed(
        &self,
        prepared: &Prepared,
        durations: Vec<f64>,
        collector: &StatisticsCollector,
    ) -> Result<PacelineComputationReport> {
        collector.record_examined(1);
        match evaluate_sequence(
            &prepared.riders,
            &durations,
            prepared.max_intensity_factor,
            prepared.start_speed_kph,
            &self.config.speed_search,
        ) {
            Ok(report) => {
                collector.record_iterations(report.compute_iterations);
                Ok(report)
            }
            Err(e) if e.is_candidate_local() => {
                debug!(event = "baseline_skipped", durations = ?durations, reason = %e);
                collector.record_failures(1);
                Ok(PacelineComputationReport::incomplete(durations, 0))
            }
            Err(e) => Err(e),
        }
    }
}

fn log_search_end(statistics: &SearchStatistics, completed: bool) {
    info!(
        event = "plan_search_end",
        sequences = statistics.sequences_examined,
        iterations = statistics.compute_iterations,
        duration_ms = statistics.elapsed.as_millis() as u64,
        completed = completed,
    );
}

/// [`PlanSearchEngine::generate_plan_package`] with the default configuration.
pub fn generate_plan_package(ingredients: &PacelineIngredients) -> Result<PacelineSolutionsPackage> {
    PlanSearchEngine::new().generate_plan_package(ingredients)
}

/// [`PlanSearchEngine::generate_fastest_for_n_strongest`] with the default
/// configuration.
pub fn generate_fastest_for_n_strongest(
    ingredients: &PacelineIngredients,
    n: usize,
) -> Result<PacelineComputationReport> {
    PlanSearchEngine::new().generate_fastest_for_n_strongest(ingredients, n)
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
