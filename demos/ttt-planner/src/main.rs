//! Team Time Trial Planner
//!
//! Reads a team roster and planner settings, searches every pull rotation
//! and prints one line per named plan.
//!
//! ```text
//! cargo run -p ttt-planner -- [team.toml] [planner.toml]
//! ```
//!
//! Set `RUST_LOG=paceline_solver=debug` to see skipped riders and baselines.

use std::path::PathBuf;
use std::process::ExitCode;

use paceline::prelude::*;

fn demo_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(name)
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let team_path = args.next().map(PathBuf::from).unwrap_or_else(|| demo_file("team.toml"));
    let planner_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| demo_file("planner.toml"));

    let roster = match Roster::load(&team_path) {
        Ok(roster) => roster,
        Err(e) => {
            eprintln!("Cannot read roster {}: {e}", team_path.display());
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = roster.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    // Missing planner settings fall back to the defaults.
    let config = PlannerConfig::load(&planner_path).unwrap_or_default();
    if let Err(e) = config.validate() {
        eprintln!("Invalid planner settings in {}: {e}", planner_path.display());
        return ExitCode::FAILURE;
    }

    let package = match paceline::plan(&config, roster.riders) {
        Ok(package) => package,
        Err(e) => {
            eprintln!("Planning failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    println!();
    for (category, report) in &package.reports {
        print_plan(*category, report);
    }

    if !package.algorithm_ran_to_completion {
        println!("\nSome plans could not be completed (need at least two fitted riders).");
    }
    ExitCode::SUCCESS
}

fn print_plan(category: PlanCategory, report: &PacelineComputationReport) {
    if !report.algorithm_ran_to_completion {
        println!("{:<28} -", category.caption());
        return;
    }

    let pulls: Vec<String> = report
        .contributions
        .iter()
        .map(|c| format!("{}:{:.0}s", c.rider_id, c.pull_duration_secs))
        .collect();
    println!(
        "{:<28} {:>6.2} km/h  IF {:.2}..{:.2}  {}",
        category.caption(),
        report.speed_kph,
        report
            .contributions
            .iter()
            .map(|c| c.intensity_factor)
            .fold(f64::INFINITY, f64::min),
        report.max_intensity_factor(),
        pulls.join(" "),
    );
}
