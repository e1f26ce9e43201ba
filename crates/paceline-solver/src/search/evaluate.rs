//! Speed search over candidate sequences, sequential or on a rayon pool.

use paceline_config::{EvaluationStrategy, SearchConfig, SpeedSearchConfig};
use paceline_core::{PacelineComputationReport, PacelineError, Result, Rider};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use super::Candidate;
use crate::bounds::search_max_feasible_speed;
use crate::checker;
use crate::simulator::exertions_at_speed;

/// Runs the maximum feasible speed search for one duration sequence and
/// packages the result.
///
/// # Errors
///
/// Whatever [`search_max_feasible_speed`] reports. Candidate-local errors
/// ([`PacelineError::is_candidate_local`]) mean the sequence has no usable
/// speed.
pub fn evaluate_sequence(
    riders: &[Rider],
    pull_durations: &[f64],
    max_intensity_factor: f64,
    start_speed_kph: f64,
    config: &SpeedSearchConfig,
) -> Result<PacelineComputationReport> {
    let outcome = search_max_feasible_speed(
        riders,
        pull_durations,
        max_intensity_factor,
        start_speed_kph,
        config,
    )?;

    let exertions = exertions_at_speed(riders, pull_durations, outcome.speed_kph)?;
    let team_average_speed_kph = exertions
        .first()
        .map_or(outcome.speed_kph, |slots| checker::team_average_speed(slots));

    Ok(PacelineComputationReport {
        pull_durations: pull_durations.to_vec(),
        speed_kph: outcome.speed_kph,
        intensity_dispersion: checker::intensity_dispersion(&outcome.contributions),
        contributions: outcome.contributions,
        team_average_speed_kph,
        algorithm_ran_to_completion: true,
        compute_iterations: outcome.iterations,
    })
}

/// Read-only inputs shared by every evaluation worker.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub riders: &'a [Rider],
    /// Distinct durations that candidate indices refer to.
    pub durations: &'a [f64],
    pub max_intensity_factor: f64,
    pub start_speed_kph: f64,
    pub speed_search: &'a SpeedSearchConfig,
}

impl EvaluationContext<'_> {
    /// Pull durations in seconds for a candidate.
    pub fn pull_durations(&self, candidate: &[usize]) -> Vec<f64> {
        candidate
            .iter()
            .map(|&i| self.durations.get(i).copied().unwrap_or(0.0))
            .collect()
    }

    pub fn evaluate(&self, candidate: &[usize]) -> Result<PacelineComputationReport> {
        evaluate_sequence(
            self.riders,
            &self.pull_durations(candidate),
            self.max_intensity_factor,
            self.start_speed_kph,
            self.speed_search,
        )
    }
}

/// Reports from one evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Successful reports in candidate order.
    pub reports: Vec<PacelineComputationReport>,
    /// Candidates with no usable speed.
    pub failures: u64,
    /// Rotations evaluated, failed searches included.
    pub compute_iterations: u64,
    /// Worker threads used; 1 when sequential.
    pub threads: usize,
}

/// Evaluates every candidate.
///
/// Small batches run on the calling thread. Larger ones run on a dedicated
/// pool sized by `search.thread_count`. Results are collected in candidate
/// order whatever the strategy, so the outcome does not depend on it.
///
/// # Errors
///
/// Errors that are not local to a candidate, such as invalid rider data,
/// abort the whole pass.
pub fn evaluate_candidates(
    context: &EvaluationContext<'_>,
    candidates: &[Candidate],
    search: &SearchConfig,
) -> Result<Evaluation> {
    let threads = search.thread_count.resolve(candidates.len());
    let parallel = threads > 1 && candidates.len() >= search.parallel_threshold;

    let (results, threads) = if parallel {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => (
                pool.install(|| evaluate_parallel(context, candidates, search.strategy)),
                threads,
            ),
            Err(e) => {
                warn!(
                    event = "pool_unavailable",
                    threads = threads,
                    error = %e,
                    "Falling back to sequential evaluation"
                );
                (evaluate_sequential(context, candidates), 1)
            }
        }
    } else {
        (evaluate_sequential(context, candidates), 1)
    };

    let mut evaluation = Evaluation {
        reports: Vec::with_capacity(results.len()),
        threads,
        ..Evaluation::default()
    };
    for (candidate, result) in candidates.iter().zip(results) {
        match result {
            Ok(report) => {
                trace!(
                    event = "candidate_evaluated",
                    durations = ?report.pull_durations,
                    speed_kph = report.speed_kph,
                    iterations = report.compute_iterations,
                );
                evaluation.compute_iterations += report.compute_iterations;
                evaluation.reports.push(report);
            }
            Err(e) if e.is_candidate_local() => {
                debug!(
                    event = "candidate_skipped",
                    durations = ?context.pull_durations(candidate),
                    reason = %e,
                );
                if let PacelineError::DidNotConverge { iterations, .. } = e {
                    evaluation.compute_iterations += iterations;
                }
                evaluation.failures += 1;
            }
            Err(e) => return Err(e),
        }
    }
    Ok(evaluation)
}

fn evaluate_sequential(
    context: &EvaluationContext<'_>,
    candidates: &[Candidate],
) -> Vec<Result<PacelineComputationReport>> {
    candidates.iter().map(|c| context.evaluate(c)).collect()
}

fn evaluate_parallel(
    context: &EvaluationContext<'_>,
    candidates: &[Candidate],
    strategy: EvaluationStrategy,
) -> Vec<Result<PacelineComputationReport>> {
    match strategy {
        EvaluationStrategy::PerSequence => {
            candidates.par_iter().map(|c| context.evaluate(c)).collect()
        }
        EvaluationStrategy::Chunked { chunk_size } => candidates
            .par_chunks(chunk_size.max(1))
            .map(|chunk| evaluate_sequential(context, chunk))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paceline_config::ThreadCount;
    use paceline_test::riders::three_rider_team;
    use smallvec::smallvec;

    fn all_candidates() -> Vec<Candidate> {
        let mut out = Vec::new();
        for a in 0..2 {
            for b in 0..2 {
                for c in 0..2 {
                    out.push(smallvec![a, b, c]);
                }
            }
        }
        out
    }

    #[test]
    fn test_evaluate_sequence_report() {
        let riders = three_rider_team();
        let report = evaluate_sequence(
            &riders,
            &[60.0, 60.0, 30.0],
            1.0,
            39.0,
            &SpeedSearchConfig::default(),
        )
        .unwrap();

        assert!(report.algorithm_ran_to_completion);
        assert_eq!(report.pull_durations, vec![60.0, 60.0, 30.0]);
        assert_eq!(report.rider_count(), 3);
        assert!((report.team_average_speed_kph - report.speed_kph).abs() < 1e-9);
        assert!(report.intensity_dispersion > 0.0);
        assert!(report.max_intensity_factor() < 1.0);
        assert!(report.compute_iterations > 0);
    }

    #[test]
    fn test_pull_durations_from_indices() {
        let riders = three_rider_team();
        let config = SpeedSearchConfig::default();
        let context = EvaluationContext {
            riders: &riders,
            durations: &[30.0, 60.0],
            max_intensity_factor: 1.0,
            start_speed_kph: 39.0,
            speed_search: &config,
        };
        assert_eq!(context.pull_durations(&[1, 0, 1]), vec![60.0, 30.0, 60.0]);
    }

    #[test]
    fn test_strategies_agree() {
        let riders = three_rider_team();
        let speed_search = SpeedSearchConfig::default();
        let context = EvaluationContext {
            riders: &riders,
            durations: &[30.0, 60.0],
            max_intensity_factor: 1.0,
            start_speed_kph: 39.0,
            speed_search: &speed_search,
        };
        let candidates = all_candidates();

        let sequential = evaluate_candidates(&context, &candidates, &SearchConfig::default()).unwrap();
        assert_eq!(sequential.threads, 1);
        assert_eq!(sequential.reports.len(), 8);

        for strategy in [
            EvaluationStrategy::PerSequence,
            EvaluationStrategy::Chunked { chunk_size: 3 },
        ] {
            let search = SearchConfig {
                thread_count: ThreadCount::Specific(2),
                parallel_threshold: 0,
                strategy,
                ..SearchConfig::default()
            };
            let parallel = evaluate_candidates(&context, &candidates, &search).unwrap();
            assert_eq!(parallel.reports, sequential.reports);
            assert_eq!(parallel.compute_iterations, sequential.compute_iterations);
            assert_eq!(parallel.failures, 0);
        }
    }

    #[test]
    fn test_failures_are_counted() {
        let riders = three_rider_team();
        let speed_search = SpeedSearchConfig {
            max_iterations: 3,
            ..SpeedSearchConfig::default()
        };
        let context = EvaluationContext {
            riders: &riders,
            durations: &[30.0, 60.0],
            max_intensity_factor: 1.0,
            start_speed_kph: 39.0,
            speed_search: &speed_search,
        };
        let evaluation =
            evaluate_candidates(&context, &all_candidates(), &SearchConfig::default()).unwrap();
        assert!(evaluation.reports.is_empty());
        assert_eq!(evaluation.failures, 8);
        assert_eq!(evaluation.compute_iterations, 24);
    }
}
