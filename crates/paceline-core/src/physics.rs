//! Speed and power conversion for a single rider.
//!
//! Power at a given speed follows an empirical polynomial in rider weight,
//! height and the cube of speed, covering rolling resistance and aerodynamic
//! drag on flat road. The inverse is solved by Newton-Raphson.
//!
//! Riders behind the leader need only a fraction of the leader's power. The
//! fraction per draft position comes from [`DRAFT_POWER_RATIOS`].

use crate::error::{PacelineError, Result};

/// Initial guess for Newton-Raphson, in kph.
pub const NEWTON_SEED_KPH: f64 = 30.0;

/// Convergence threshold between successive Newton-Raphson estimates, in kph.
pub const NEWTON_TOLERANCE_KPH: f64 = 1e-6;

/// Iteration bound for Newton-Raphson.
pub const NEWTON_MAX_ITERATIONS: usize = 100;

/// Power needed in each draft position relative to the leader.
///
/// Position 1 is the leader. Positions past the end reuse the last entry.
pub const DRAFT_POWER_RATIOS: [f64; 8] = [1.0, 0.717, 0.660, 0.631, 0.617, 0.604, 0.593, 0.585];

const ROLLING_COEFFICIENT: f64 = 0.0186;
const DRAG_CONSTANT: f64 = -0.000537;
const DRAG_PER_KG: f64 = 0.0000223;
const DRAG_PER_CM: f64 = 0.0000133;

/// Watts needed to ride solo at `kph`.
///
/// # Errors
///
/// [`PacelineError::InvalidInput`] for non-positive weight or a negative or
/// non-finite speed.
///
/// # Examples
///
/// ```
/// use paceline_core::physics::power_from_speed;
///
/// let watts = power_from_speed(40.0, 75.0, 180.0).unwrap();
/// assert!(watts > 200.0 && watts < 300.0);
/// ```
pub fn power_from_speed(kph: f64, weight_kg: f64, height_cm: f64) -> Result<f64> {
    check_body(weight_kg, height_cm)?;
    if !kph.is_finite() || kph < 0.0 {
        return Err(PacelineError::InvalidInput(format!(
            "speed must be a non-negative number, got {kph}"
        )));
    }
    let (linear, cubic) = coefficients(weight_kg, height_cm);
    Ok(linear * kph + cubic * kph.powi(3))
}

/// Solo speed in kph sustained by `watts`.
///
/// # Errors
///
/// - [`PacelineError::InvalidInput`] for non-positive weight or negative power.
/// - [`PacelineError::Convergence`] if the estimates do not settle within
///   [`NEWTON_MAX_ITERATIONS`].
pub fn speed_from_power(watts: f64, weight_kg: f64, height_cm: f64) -> Result<f64> {
    check_body(weight_kg, height_cm)?;
    if !watts.is_finite() || watts < 0.0 {
        return Err(PacelineError::InvalidInput(format!(
            "power must be a non-negative number, got {watts}"
        )));
    }

    let (linear, cubic) = coefficients(weight_kg, height_cm);
    let mut speed = NEWTON_SEED_KPH;
    for _ in 0..NEWTON_MAX_ITERATIONS {
        let f = linear * speed + cubic * speed.powi(3) - watts;
        let slope = linear + 3.0 * cubic * speed * speed;
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        let next = speed - f / slope;
        if (next - speed).abs() < NEWTON_TOLERANCE_KPH {
            return Ok(next);
        }
        speed = next;
    }

    Err(PacelineError::Convergence {
        iterations: NEWTON_MAX_ITERATIONS,
        last_estimate: speed,
    })
}

/// Power multiplier for a draft position (1 = leader).
///
/// Never fails: positions beyond the table reuse the last known value and
/// position 0 is treated as the lead.
pub fn drag_ratio_for_position(position: usize) -> f64 {
    let index = position.clamp(1, DRAFT_POWER_RATIOS.len()) - 1;
    DRAFT_POWER_RATIOS[index]
}

/// Energy in kilojoules for `watts` held over `seconds`.
#[inline]
pub fn kilojoules(watts: f64, seconds: f64) -> f64 {
    watts * seconds / 1000.0
}

fn coefficients(weight_kg: f64, height_cm: f64) -> (f64, f64) {
    let linear = ROLLING_COEFFICIENT * weight_kg;
    let cubic = DRAG_CONSTANT + DRAG_PER_KG * weight_kg + DRAG_PER_CM * height_cm;
    (linear, cubic)
}

fn check_body(weight_kg: f64, height_cm: f64) -> Result<()> {
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(PacelineError::InvalidInput(format!(
            "rider weight must be positive, got {weight_kg} kg"
        )));
    }
    if !height_cm.is_finite() || height_cm < 0.0 {
        return Err(PacelineError::InvalidInput(format!(
            "rider height must be non-negative, got {height_cm} cm"
        )));
    }
    Ok(())
}
