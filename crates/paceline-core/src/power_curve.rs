//! Duration to power curve fitting and evaluation.
//!
//! Two models are supported:
//!
//! - **Decay curve**: `power = coefficient * duration^exponent` with a negative
//!   exponent. Used for one-hour power and short pull capacity.
//! - **Critical power**: `power = (CP * duration + W') / duration`, fitted by
//!   linear regression of work on time.
//!
//! Durations are in seconds and must be at least one second.
//!
//! # Examples
//!
//! ```
//! use paceline_core::power_curve::{self, PowerCurve};
//!
//! let fit = power_curve::fit(&[(60.0, 400.0), (600.0, 300.0), (3600.0, 250.0)]).unwrap();
//! assert!(fit.curve.exponent < 0.0);
//!
//! let curve = PowerCurve::new(500.0, -0.1);
//! let watts = curve.evaluate(3600.0).unwrap();
//! assert!(watts < 500.0);
//! ```

use crate::error::{PacelineError, Result};

/// Shortest duration any curve may be evaluated or fitted at.
pub const MIN_DURATION_SECS: f64 = 1.0;

const MAX_FIT_ITERATIONS: usize = 100;
const INITIAL_DAMPING: f64 = 1e-3;
const MAX_DAMPING: f64 = 1e12;

/// A fitted decay curve `power = coefficient * duration^exponent`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerCurve {
    pub coefficient: f64,
    pub exponent: f64,
}

impl PowerCurve {
    /// A curve with no parameters. Riders carrying it are excluded from search.
    pub const UNFITTED: PowerCurve = PowerCurve {
        coefficient: 0.0,
        exponent: 0.0,
    };

    pub fn new(coefficient: f64, exponent: f64) -> Self {
        Self {
            coefficient,
            exponent,
        }
    }

    /// Builds the curve with the given exponent that passes through `watts` at `duration_secs`.
    pub fn through(watts: f64, duration_secs: f64, exponent: f64) -> Result<Self> {
        check_duration(duration_secs)?;
        Ok(Self::new(watts / duration_secs.powf(exponent), exponent))
    }

    /// Evaluates the curve at the given duration.
    ///
    /// # Errors
    ///
    /// Returns [`PacelineError::InvalidInput`] for durations below one second.
    pub fn evaluate(&self, duration_secs: f64) -> Result<f64> {
        evaluate(self.coefficient, self.exponent, duration_secs)
    }

    /// Returns true when the curve carries usable parameters.
    pub fn is_fitted(&self) -> bool {
        self.coefficient > 0.0 && self.coefficient.is_finite() && self.exponent.is_finite()
    }

    /// Evaluates the curve at each duration, pairing input with prediction.
    pub fn predicted_points(&self, durations: &[f64]) -> Result<Vec<(f64, f64)>> {
        durations
            .iter()
            .map(|&d| Ok((d, self.evaluate(d)?)))
            .collect()
    }
}

/// Result of fitting a decay curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveFit {
    pub curve: PowerCurve,
    /// Coefficient of determination in linear (watts) space.
    pub r_squared: f64,
}

impl CurveFit {
    pub fn coefficient(&self) -> f64 {
        self.curve.coefficient
    }

    pub fn exponent(&self) -> f64 {
        self.curve.exponent
    }
}

/// Critical power model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalPowerFit {
    /// Critical power in watts.
    pub cp_watts: f64,
    /// Anaerobic work capacity in joules.
    pub w_prime_joules: f64,
    pub r_squared: f64,
}

impl CriticalPowerFit {
    /// Predicts sustainable power for the given duration.
    pub fn power_at(&self, duration_secs: f64) -> Result<f64> {
        check_duration(duration_secs)?;
        Ok((self.cp_watts * duration_secs + self.w_prime_joules) / duration_secs)
    }
}

/// Evaluates `coefficient * duration^exponent`.
pub fn evaluate(coefficient: f64, exponent: f64, duration_secs: f64) -> Result<f64> {
    check_duration(duration_secs)?;
    Ok(coefficient * duration_secs.powf(exponent))
}

/// Fits a decay curve to `(duration_secs, watts)` points by nonlinear least squares.
///
/// A log-log linear regression provides the starting point, which is then
/// refined by damped Gauss-Newton iterations on the residuals in watts.
///
/// # Errors
///
/// - [`PacelineError::InvalidInput`] if any duration is below one second or
///   any value is not finite or negative.
/// - [`PacelineError::InsufficientData`] if fewer than two distinct durations
///   carry positive power.
pub fn fit(points: &[(f64, f64)]) -> Result<CurveFit> {
    let points = usable_points(points)?;

    let log_points: Vec<(f64, f64)> = points.iter().map(|&(x, y)| (x.ln(), y.ln())).collect();
    let (slope, intercept) = linear_regression(&log_points)?;

    let mut a = intercept.exp();
    let mut b = slope;
    let mut sse = sum_squared_error(&points, a, b);
    let mut damping = INITIAL_DAMPING;

    for _ in 0..MAX_FIT_ITERATIONS {
        // Normal equations J'J and J'r for the two parameters.
        let (mut jaa, mut jab, mut jbb, mut ra, mut rb) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for &(x, y) in &points {
            let da = x.powf(b);
            let predicted = a * da;
            let db = predicted * x.ln();
            let residual = y - predicted;
            jaa += da * da;
            jab += da * db;
            jbb += db * db;
            ra += da * residual;
            rb += db * residual;
        }

        let mut improved = None;
        while damping < MAX_DAMPING {
            let m00 = jaa * (1.0 + damping);
            let m11 = jbb * (1.0 + damping);
            let det = m00 * m11 - jab * jab;
            if det.abs() > f64::EPSILON {
                let step_a = (ra * m11 - jab * rb) / det;
                let step_b = (m00 * rb - jab * ra) / det;
                let candidate = sum_squared_error(&points, a + step_a, b + step_b);
                if candidate.is_finite() && candidate < sse {
                    improved = Some((a + step_a, b + step_b, candidate));
                    damping /= 10.0;
                    break;
                }
            }
            damping *= 10.0;
        }

        let Some((next_a, next_b, next_sse)) = improved else {
            break;
        };
        let gain = sse - next_sse;
        a = next_a;
        b = next_b;
        sse = next_sse;
        if gain <= 1e-12 * sse.max(1.0) {
            break;
        }
    }

    let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean).powi(2)).sum();

    Ok(CurveFit {
        curve: PowerCurve::new(a, b),
        r_squared: r_squared(sse, ss_tot),
    })
}

/// Fits the critical power model to `(duration_secs, watts)` points.
///
/// Regresses work (`watts * duration`) on duration: the slope is CP and the
/// intercept is W'. R² is reported against the power predictions.
pub fn fit_critical_power(points: &[(f64, f64)]) -> Result<CriticalPowerFit> {
    let points = usable_points(points)?;

    let work_time: Vec<(f64, f64)> = points.iter().map(|&(t, p)| (t, p * t)).collect();
    let (cp, w_prime) = linear_regression(&work_time)?;

    let mean = points.iter().map(|(_, y)| y).sum::<f64>() / points.len() as f64;
    let ss_tot: f64 = points.iter().map(|(_, y)| (y - mean).powi(2)).sum();
    let ss_res: f64 = points
        .iter()
        .map(|&(t, p)| (p - (cp * t + w_prime) / t).powi(2))
        .sum();

    Ok(CriticalPowerFit {
        cp_watts: cp,
        w_prime_joules: w_prime,
        r_squared: r_squared(ss_res, ss_tot),
    })
}

fn check_duration(duration_secs: f64) -> Result<()> {
    if !duration_secs.is_finite() || duration_secs < MIN_DURATION_SECS {
        return Err(PacelineError::InvalidInput(format!(
            "duration must be at least {MIN_DURATION_SECS} second, got {duration_secs}"
        )));
    }
    Ok(())
}

// Validates points and drops those with zero power.
fn usable_points(points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>> {
    let mut usable = Vec::with_capacity(points.len());
    for &(duration, watts) in points {
        check_duration(duration)?;
        if !watts.is_finite() || watts < 0.0 {
            return Err(PacelineError::InvalidInput(format!(
                "power must be a non-negative number, got {watts} at {duration}s"
            )));
        }
        if watts > 0.0 {
            usable.push((duration, watts));
        }
    }

    let mut durations: Vec<f64> = usable.iter().map(|(d, _)| *d).collect();
    durations.sort_by(f64::total_cmp);
    durations.dedup();
    if durations.len() < 2 {
        return Err(PacelineError::InsufficientData(format!(
            "need at least 2 distinct positive points, got {}",
            durations.len()
        )));
    }

    Ok(usable)
}

/// Ordinary least squares on (x, y) pairs. Returns (slope, intercept).
fn linear_regression(points: &[(f64, f64)]) -> Result<(f64, f64)> {
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denom = n * sum_xx - sum_x * sum_x;
    if denom.abs() < 1e-12 {
        return Err(PacelineError::InsufficientData(
            "durations are too close together to fit a curve".to_string(),
        ));
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Ok((slope, intercept))
}

fn sum_squared_error(points: &[(f64, f64)], a: f64, b: f64) -> f64 {
    points
        .iter()
        .map(|&(x, y)| (y - a * x.powf(b)).powi(2))
        .sum()
}

fn r_squared(ss_res: f64, ss_tot: f64) -> f64 {
    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEST_EFFORTS: [(f64, f64); 5] = [
        (30.0, 425.0),
        (300.0, 292.0),
        (1200.0, 254.0),
        (1800.0, 252.0),
        (2400.0, 244.0),
    ];

    #[test]
    fn test_fit_decay_exponent_is_negative_and_shallow() {
        let fit = fit(&BEST_EFFORTS).unwrap();
        assert!(fit.exponent() < 0.0 && fit.exponent() > -0.3, "{}", fit.exponent());
        assert!(fit.r_squared > 0.9);
    }

    #[test]
    fn test_fit_extrapolates_one_hour_power() {
        let fit = fit(&BEST_EFFORTS).unwrap();
        let one_hour = fit.curve.evaluate(3600.0).unwrap();

        // Independent estimate from a straight line through the log-log points.
        let logs: Vec<(f64, f64)> = BEST_EFFORTS.iter().map(|&(x, y)| (x.ln(), y.ln())).collect();
        let (slope, intercept) = linear_regression(&logs).unwrap();
        let implied = (intercept + slope * 3600f64.ln()).exp();

        assert!((one_hour - implied).abs() / implied < 0.05);
        assert!(one_hour < 244.0);
    }

    #[test]
    fn test_fit_recovers_exact_curve() {
        let points: Vec<(f64, f64)> = [10.0, 100.0, 1000.0, 3000.0]
            .iter()
            .map(|&t| (t, 600.0 * f64::powf(t, -0.12)))
            .collect();
        let fit = fit(&points).unwrap();
        assert!((fit.coefficient() - 600.0).abs() < 1e-3);
        assert!((fit.exponent() + 0.12).abs() < 1e-6);
        assert!(fit.r_squared > 0.999_999);
    }

    #[test]
    fn test_fit_rejects_zero_duration() {
        let err = fit(&[(0.0, 500.0), (60.0, 400.0), (600.0, 300.0)]).unwrap_err();
        assert!(matches!(err, PacelineError::InvalidInput(_)));
    }

    #[test]
    fn test_fit_requires_two_distinct_points() {
        let err = fit(&[(60.0, 400.0)]).unwrap_err();
        assert!(matches!(err, PacelineError::InsufficientData(_)));

        let err = fit(&[(60.0, 400.0), (60.0, 410.0)]).unwrap_err();
        assert!(matches!(err, PacelineError::InsufficientData(_)));

        let err = fit(&[(60.0, 400.0), (600.0, 0.0)]).unwrap_err();
        assert!(matches!(err, PacelineError::InsufficientData(_)));
    }

    #[test]
    fn test_evaluate_rejects_short_duration() {
        assert!(evaluate(500.0, -0.1, 0.5).is_err());
        assert!(evaluate(500.0, -0.1, f64::NAN).is_err());
        assert!((evaluate(500.0, 0.0, 1.0).unwrap() - 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_predicted_points() {
        let curve = PowerCurve::new(500.0, -0.1);
        let points = curve.predicted_points(&[1.0, 60.0, 3600.0]).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (1.0, 500.0));
        assert_eq!(points[2].0, 3600.0);
        assert!((points[1].1 - 500.0 * 60f64.powf(-0.1)).abs() < 1e-9);
        // Falls with duration.
        assert!(points[0].1 > points[1].1 && points[1].1 > points[2].1);

        assert!(curve.predicted_points(&[]).unwrap().is_empty());
        assert!(matches!(
            curve.predicted_points(&[60.0, 0.5]),
            Err(PacelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_curve_through_point() {
        let curve = PowerCurve::through(300.0, 3600.0, -0.07).unwrap();
        assert!((curve.evaluate(3600.0).unwrap() - 300.0).abs() < 1e-9);
        assert!(curve.is_fitted());
        assert!(!PowerCurve::UNFITTED.is_fitted());
    }

    #[test]
    fn test_critical_power_fit() {
        // Synthetic efforts from CP = 250 W, W' = 20 kJ.
        let points: Vec<(f64, f64)> = [180.0, 300.0, 600.0, 1200.0]
            .iter()
            .map(|&t| (t, 250.0 + 20_000.0 / t))
            .collect();
        let fit = fit_critical_power(&points).unwrap();
        assert!((fit.cp_watts - 250.0).abs() < 1e-6);
        assert!((fit.w_prime_joules - 20_000.0).abs() < 1e-3);
        assert!((fit.power_at(400.0).unwrap() - 300.0).abs() < 1e-6);
        assert!(fit.power_at(0.0).is_err());
    }
}
