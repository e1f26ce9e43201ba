//! Work assignments, exertions, contributions and evaluated plans.

use std::fmt;

/// One slot of a rider's rotation: where they ride, for how long, how fast.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiderWorkAssignment {
    /// Draft position, 1 = pulling at the front.
    pub position: usize,
    pub duration_secs: f64,
    pub speed_kph: f64,
}

impl RiderWorkAssignment {
    /// Harmless default: at the front, for no time, at no speed.
    pub const IDLE: RiderWorkAssignment = RiderWorkAssignment {
        position: 1,
        duration_secs: 0.0,
        speed_kph: 0.0,
    };

    pub fn new(position: usize, duration_secs: f64, speed_kph: f64) -> Self {
        Self {
            position,
            duration_secs,
            speed_kph,
        }
    }
}

/// Realized effort for one work assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiderExertion {
    pub position: usize,
    pub duration_secs: f64,
    pub speed_kph: f64,
    pub wattage: f64,
    pub kilojoules: f64,
}

/// A rider's effort aggregated over one full rotation.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiderContribution {
    pub rider_id: String,
    pub pull_duration_secs: f64,
    pub pull_watts: f64,
    pub pull_wkg: f64,
    /// Pull wattage relative to one-hour power.
    pub pull_ratio_to_one_hour: f64,
    /// Sustainable pull wattage the pull was checked against.
    pub pull_capacity_watts: f64,
    /// Wattage per draft position; index 0 is position 1.
    pub position_watts: Vec<f64>,
    pub total_kilojoules: f64,
    pub average_watts: f64,
    pub normalized_watts: f64,
    pub intensity_factor: f64,
    /// Human-readable reason when the effort breaks a physiological limit.
    pub effort_constraint_violation_reason: Option<String>,
}

impl RiderContribution {
    /// Wattage while riding in `position` (1 = front).
    pub fn watts_at_position(&self, position: usize) -> Option<f64> {
        position
            .checked_sub(1)
            .and_then(|i| self.position_watts.get(i))
            .copied()
    }

    pub fn is_violated(&self) -> bool {
        self.effort_constraint_violation_reason.is_some()
    }
}

/// One evaluated pull-duration sequence.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PacelineComputationReport {
    /// Pull duration per rider, in rotation order.
    pub pull_durations: Vec<f64>,
    pub speed_kph: f64,
    /// One entry per rider, in rotation order.
    pub contributions: Vec<RiderContribution>,
    pub team_average_speed_kph: f64,
    /// Population standard deviation of intensity factors.
    pub intensity_dispersion: f64,
    pub algorithm_ran_to_completion: bool,
    pub compute_iterations: u64,
}

impl PacelineComputationReport {
    /// A report for a search that found nothing usable.
    pub fn incomplete(pull_durations: Vec<f64>, compute_iterations: u64) -> Self {
        Self {
            pull_durations,
            compute_iterations,
            ..Self::default()
        }
    }

    /// Looks up a rider's contribution by id.
    pub fn contribution(&self, rider_id: &str) -> Option<&RiderContribution> {
        self.contributions.iter().find(|c| c.rider_id == rider_id)
    }

    pub fn rider_count(&self) -> usize {
        self.contributions.len()
    }

    pub fn mean_intensity_factor(&self) -> f64 {
        if self.contributions.is_empty() {
            return 0.0;
        }
        self.contributions
            .iter()
            .map(|c| c.intensity_factor)
            .sum::<f64>()
            / self.contributions.len() as f64
    }

    pub fn max_intensity_factor(&self) -> f64 {
        self.contributions
            .iter()
            .map(|c| c.intensity_factor)
            .fold(0.0, f64::max)
    }

    /// Seconds for one full rotation.
    pub fn rotation_secs(&self) -> f64 {
        self.pull_durations.iter().sum()
    }

    /// True when the report carries a usable plan.
    pub fn is_usable(&self) -> bool {
        self.algorithm_ran_to_completion && !self.contributions.is_empty()
    }
}

/// Named plan variants returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanCategory {
    /// Everybody pulls for 30 seconds.
    ThirtySecondPull,
    /// Everybody pulls for 60 seconds.
    SixtySecondPull,
    /// Most even intensity among plans close to the fastest.
    BalancedIntensity,
    /// Highest mean intensity factor.
    EverybodyPullsHard,
    FastestFullTeam,
    /// Fastest plan for the five strongest riders.
    FastestLastFive,
    /// Fastest plan for the four strongest riders.
    FastestLastFour,
}

impl PlanCategory {
    pub const ALL: [PlanCategory; 7] = [
        PlanCategory::ThirtySecondPull,
        PlanCategory::SixtySecondPull,
        PlanCategory::BalancedIntensity,
        PlanCategory::EverybodyPullsHard,
        PlanCategory::FastestFullTeam,
        PlanCategory::FastestLastFive,
        PlanCategory::FastestLastFour,
    ];

    /// Caption suitable for report headings.
    pub fn caption(&self) -> &'static str {
        match self {
            PlanCategory::ThirtySecondPull => "30 second pulls",
            PlanCategory::SixtySecondPull => "60 second pulls",
            PlanCategory::BalancedIntensity => "Balanced intensity",
            PlanCategory::EverybodyPullsHard => "Everybody pulls hard",
            PlanCategory::FastestFullTeam => "Fastest full team",
            PlanCategory::FastestLastFive => "Fastest last five",
            PlanCategory::FastestLastFour => "Fastest last four",
        }
    }

    /// Team size the category is restricted to, if any.
    pub fn strongest_riders(&self) -> Option<usize> {
        match self {
            PlanCategory::FastestLastFive => Some(5),
            PlanCategory::FastestLastFour => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for PlanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanCategory::ThirtySecondPull => write!(f, "thirty_second_pull"),
            PlanCategory::SixtySecondPull => write!(f, "sixty_second_pull"),
            PlanCategory::BalancedIntensity => write!(f, "balanced_intensity"),
            PlanCategory::EverybodyPullsHard => write!(f, "everybody_pulls_hard"),
            PlanCategory::FastestFullTeam => write!(f, "fastest_full_team"),
            PlanCategory::FastestLastFive => write!(f, "fastest_last_five"),
            PlanCategory::FastestLastFour => write!(f, "fastest_last_four"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contribution(id: &str, intensity_factor: f64) -> RiderContribution {
        RiderContribution {
            rider_id: id.to_string(),
            intensity_factor,
            position_watts: vec![320.0, 230.0, 210.0],
            ..RiderContribution::default()
        }
    }

    #[test]
    fn test_incomplete_report() {
        let report = PacelineComputationReport::incomplete(vec![30.0, 60.0], 7);
        assert!(!report.algorithm_ran_to_completion);
        assert!(report.contributions.is_empty());
        assert!(!report.is_usable());
        assert_eq!(report.compute_iterations, 7);
        assert_eq!(report.mean_intensity_factor(), 0.0);
        assert_eq!(report.rotation_secs(), 90.0);
    }

    #[test]
    fn test_rotation_secs() {
        let report = PacelineComputationReport {
            pull_durations: vec![60.0, 0.0, 45.5, 30.0],
            ..PacelineComputationReport::default()
        };
        assert!((report.rotation_secs() - 135.5).abs() < f64::EPSILON);
        assert_eq!(PacelineComputationReport::default().rotation_secs(), 0.0);
    }

    #[test]
    fn test_contribution_lookup() {
        let report = PacelineComputationReport {
            contributions: vec![contribution("a", 0.8), contribution("b", 0.9)],
            algorithm_ran_to_completion: true,
            ..PacelineComputationReport::default()
        };
        assert!(report.contribution("b").is_some());
        assert!(report.contribution("z").is_none());
        assert!((report.mean_intensity_factor() - 0.85).abs() < 1e-12);
        assert!((report.max_intensity_factor() - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_watts_at_position() {
        let c = contribution("a", 0.8);
        assert_eq!(c.watts_at_position(1), Some(320.0));
        assert_eq!(c.watts_at_position(3), Some(210.0));
        assert_eq!(c.watts_at_position(0), None);
        assert_eq!(c.watts_at_position(4), None);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(PlanCategory::FastestLastFour.to_string(), "fastest_last_four");
        assert_eq!(PlanCategory::FastestLastFive.strongest_riders(), Some(5));
        assert_eq!(PlanCategory::BalancedIntensity.strongest_riders(), None);
    }
}
