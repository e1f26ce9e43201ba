//! Picks named plans out of a set of evaluated reports.
//!
//! Every rule returns an index into the slice. Comparisons are total, and
//! when two reports compare equal the earlier one wins.

use std::cmp::Ordering;

use paceline_core::PacelineComputationReport;

/// Highest speed, then lower intensity dispersion.
pub fn fastest(reports: &[PacelineComputationReport]) -> Option<usize> {
    best_by(reports, |a, b| {
        a.speed_kph
            .total_cmp(&b.speed_kph)
            .then_with(|| b.intensity_dispersion.total_cmp(&a.intensity_dispersion))
    })
}

/// Lowest intensity dispersion among reports within `tolerance_kph` of the
/// fastest, then higher speed.
pub fn balanced(reports: &[PacelineComputationReport], tolerance_kph: f64) -> Option<usize> {
    let top = reports[fastest(reports)?].speed_kph;
    let mut best: Option<usize> = None;
    for (index, report) in reports.iter().enumerate() {
        if report.speed_kph < top - tolerance_kph {
            continue;
        }
        let better = match best {
            None => true,
            Some(current) => {
                let current = &reports[current];
                current
                    .intensity_dispersion
                    .total_cmp(&report.intensity_dispersion)
                    .then_with(|| report.speed_kph.total_cmp(&current.speed_kph))
                    == Ordering::Greater
            }
        };
        if better {
            best = Some(index);
        }
    }
    best
}

/// Highest mean intensity factor, then higher speed.
pub fn hardest(reports: &[PacelineComputationReport]) -> Option<usize> {
    best_by(reports, |a, b| {
        a.mean_intensity_factor()
            .total_cmp(&b.mean_intensity_factor())
            .then_with(|| a.speed_kph.total_cmp(&b.speed_kph))
    })
}

// Index of the first report that nothing later strictly beats under `cmp`.
fn best_by(
    reports: &[PacelineComputationReport],
    cmp: impl Fn(&PacelineComputationReport, &PacelineComputationReport) -> Ordering,
) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, report) in reports.iter().enumerate() {
        match best {
            Some(current) if cmp(report, &reports[current]) != Ordering::Greater => {}
            _ => best = Some(index),
        }
    }
    best
}
