//! Error types for paceline planning

use thiserror::Error;

/// Main error type for paceline planning operations.
///
/// Constraint violations are not errors. They are carried as data on
/// [`RiderContribution`](crate::RiderContribution) so the search can skip
/// infeasible candidates without unwinding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PacelineError {
    /// Malformed numeric input (non-positive weight, duration below one second, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Curve fit attempted with too few usable data points
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Newton-Raphson inversion of the speed/power polynomial did not settle
    #[error("Speed from power did not converge after {iterations} iterations (last estimate {last_estimate} kph)")]
    Convergence { iterations: usize, last_estimate: f64 },

    /// Speed search hit its iteration ceiling
    #[error("Speed search did not converge after {iterations} iterations (last speed {speed_kph} kph)")]
    DidNotConverge { iterations: u64, speed_kph: f64 },

    /// No feasible speed exists at or above the search floor
    #[error("No feasible speed: {0}")]
    Infeasible(String),
}

impl PacelineError {
    /// Returns true for errors that only invalidate a single candidate.
    ///
    /// The plan search skips such candidates and keeps going.
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            PacelineError::Convergence { .. }
                | PacelineError::DidNotConverge { .. }
                | PacelineError::Infeasible(_)
        )
    }
}

/// Result type alias for paceline operations
pub type Result<T> = std::result::Result<T, PacelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_local_errors() {
        assert!(PacelineError::Infeasible("x".into()).is_candidate_local());
        assert!(PacelineError::DidNotConverge {
            iterations: 3,
            speed_kph: 40.0
        }
        .is_candidate_local());
        assert!(!PacelineError::InvalidInput("weight".into()).is_candidate_local());
        assert!(!PacelineError::InsufficientData("1 point".into()).is_candidate_local());
    }

    #[test]
    fn test_display() {
        let err = PacelineError::Convergence {
            iterations: 100,
            last_estimate: 12.5,
        };
        assert_eq!(
            err.to_string(),
            "Speed from power did not converge after 100 iterations (last estimate 12.5 kph)"
        );
    }
}
