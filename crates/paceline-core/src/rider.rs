//! Rider records and their power profile.

use std::fmt;

use crate::error::{PacelineError, Result};
use crate::power_curve::{self, PowerCurve};

/// Duration one-hour power is read from the sustained curve.
pub const ONE_HOUR_SECS: f64 = 3600.0;

// Pull length (upper bound, seconds) to the effort duration whose best power
// the pull is capped at. Longer pulls use `LONG_PULL_REFERENCE_SECS`.
const PULL_REFERENCE_SECS: [(f64, f64); 4] =
    [(30.0, 210.0), (60.0, 300.0), (120.0, 720.0), (180.0, 900.0)];
const LONG_PULL_REFERENCE_SECS: f64 = 1200.0;

// Efforts at or beyond this length feed the one-hour curve.
const SUSTAINED_EFFORT_MIN_SECS: f64 = 300.0;
// Efforts up to this length feed the pull curve.
const PULL_EFFORT_MAX_SECS: f64 = 1200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

/// An immutable rider record with a fitted power profile.
///
/// `weight_kg` must be positive for any speed/power conversion. Riders whose
/// curves are [`PowerCurve::UNFITTED`] are excluded from plan search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub struct Rider {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub weight_kg: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub height_cm: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub gender: Gender,
    #[cfg_attr(feature = "serde", serde(default))]
    pub age_years: u32,
    /// Functional threshold power as reported by the platform.
    #[cfg_attr(feature = "serde", serde(default))]
    pub zftp_watts: f64,
    /// Manual correction added to every pull capacity.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pull_adjustment_watts: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub critical_power_watts: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub w_prime_joules: f64,
    /// Sustained-power decay curve, read at one hour.
    #[cfg_attr(feature = "serde", serde(default))]
    pub one_hour_curve: PowerCurve,
    /// Short-effort decay curve used for pull capacity.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pull_curve: PowerCurve,
}

impl Rider {
    pub fn new(id: impl Into<String>, weight_kg: f64, height_cm: f64) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            weight_kg,
            height_cm,
            gender: Gender::Unspecified,
            age_years: 0,
            zftp_watts: 0.0,
            pull_adjustment_watts: 0.0,
            critical_power_watts: 0.0,
            w_prime_joules: 0.0,
            one_hour_curve: PowerCurve::UNFITTED,
            pull_curve: PowerCurve::UNFITTED,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_age(mut self, age_years: u32) -> Self {
        self.age_years = age_years;
        self
    }

    pub fn with_zftp(mut self, watts: f64) -> Self {
        self.zftp_watts = watts;
        self
    }

    pub fn with_pull_adjustment(mut self, watts: f64) -> Self {
        self.pull_adjustment_watts = watts;
        self
    }

    pub fn with_critical_power(mut self, cp_watts: f64, w_prime_joules: f64) -> Self {
        self.critical_power_watts = cp_watts;
        self.w_prime_joules = w_prime_joules;
        self
    }

    pub fn with_one_hour_curve(mut self, curve: PowerCurve) -> Self {
        self.one_hour_curve = curve;
        self
    }

    pub fn with_pull_curve(mut self, curve: PowerCurve) -> Self {
        self.pull_curve = curve;
        self
    }

    /// Fits the one-hour, pull and critical power models from best efforts.
    ///
    /// Efforts of five minutes or longer feed the one-hour curve and efforts
    /// up to twenty minutes feed the pull curve. Either subset falls back to
    /// the full set when it has fewer than two points. The critical power
    /// fit is best effort and left at zero when it cannot be made.
    ///
    /// # Errors
    ///
    /// Propagates [`PacelineError::InvalidInput`] and
    /// [`PacelineError::InsufficientData`] from the decay-curve fits.
    pub fn with_fitted_curves(mut self, efforts: &[(f64, f64)]) -> Result<Self> {
        let sustained = subset_or_all(efforts, |d| d >= SUSTAINED_EFFORT_MIN_SECS);
        let short = subset_or_all(efforts, |d| d <= PULL_EFFORT_MAX_SECS);

        self.one_hour_curve = power_curve::fit(&sustained)?.curve;
        self.pull_curve = power_curve::fit(&short)?.curve;
        if let Ok(cp) = power_curve::fit_critical_power(efforts) {
            self.critical_power_watts = cp.cp_watts;
            self.w_prime_joules = cp.w_prime_joules;
        }
        Ok(self)
    }

    /// Checks the invariants speed/power conversion relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(PacelineError::InvalidInput(format!(
                "rider {} has non-positive weight {}",
                self.id, self.weight_kg
            )));
        }
        if !self.height_cm.is_finite() || self.height_cm < 0.0 {
            return Err(PacelineError::InvalidInput(format!(
                "rider {} has negative height {}",
                self.id, self.height_cm
            )));
        }
        Ok(())
    }

    /// Returns true when both curves are fitted.
    pub fn is_searchable(&self) -> bool {
        self.one_hour_curve.is_fitted() && self.pull_curve.is_fitted()
    }

    /// Power sustainable for one hour.
    pub fn one_hour_watts(&self) -> f64 {
        self.one_hour_curve
            .evaluate(ONE_HOUR_SECS)
            .unwrap_or_default()
    }

    /// Highest wattage the rider can hold at the front for a pull of `pull_secs`.
    ///
    /// A 30 second pull is capped at 3.5 minute power, one minute at 5 minute
    /// power, two minutes at 12, three minutes at 15 and anything longer at
    /// 20 minute power. The pull adjustment is added on top.
    pub fn pull_capacity_watts(&self, pull_secs: f64) -> f64 {
        let reference = PULL_REFERENCE_SECS
            .iter()
            .find(|(max_pull, _)| pull_secs <= *max_pull)
            .map_or(LONG_PULL_REFERENCE_SECS, |(_, reference)| *reference);
        self.pull_curve.evaluate(reference).unwrap_or_default() + self.pull_adjustment_watts
    }

    /// One-hour watts per kilogram. Zero for a weightless rider.
    pub fn power_to_weight(&self) -> f64 {
        if self.weight_kg > 0.0 {
            self.one_hour_watts() / self.weight_kg
        } else {
            0.0
        }
    }

    pub fn zftp_wkg(&self) -> f64 {
        if self.weight_kg > 0.0 {
            self.zftp_watts / self.weight_kg
        } else {
            0.0
        }
    }
}

impl fmt::Display for Rider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.0} W, {:.2} W/kg)",
            self.name,
            self.one_hour_watts(),
            self.power_to_weight()
        )
    }
}

fn subset_or_all(efforts: &[(f64, f64)], keep: impl Fn(f64) -> bool) -> Vec<(f64, f64)> {
    let subset: Vec<(f64, f64)> = efforts.iter().copied().filter(|(d, _)| keep(*d)).collect();
    if subset.len() >= 2 {
        subset
    } else {
        efforts.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rider() -> Rider {
        Rider::new("58160", 75.0, 178.0)
            .with_one_hour_curve(PowerCurve::through(280.0, ONE_HOUR_SECS, -0.07).unwrap())
            .with_pull_curve(PowerCurve::through(280.0, ONE_HOUR_SECS, -0.09).unwrap())
    }

    #[test]
    fn test_one_hour_watts() {
        assert!((rider().one_hour_watts() - 280.0).abs() < 1e-9);
        assert_eq!(Rider::new("x", 70.0, 170.0).one_hour_watts(), 0.0);
    }

    #[test]
    fn test_pull_capacity_decreases_with_pull_length() {
        let r = rider();
        let thirty = r.pull_capacity_watts(30.0);
        let sixty = r.pull_capacity_watts(60.0);
        let four_min = r.pull_capacity_watts(240.0);
        assert!(thirty > sixty && sixty > four_min);
        assert!((thirty - r.pull_curve.evaluate(210.0).unwrap()).abs() < 1e-9);
        assert!((four_min - r.pull_curve.evaluate(1200.0).unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_pull_adjustment_applies() {
        let base = rider().pull_capacity_watts(60.0);
        let adjusted = rider().with_pull_adjustment(15.0).pull_capacity_watts(60.0);
        assert!((adjusted - base - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_to_weight() {
        let r = rider();
        assert!((r.power_to_weight() - 280.0 / 75.0).abs() < 1e-9);
        let mut weightless = r.clone();
        weightless.weight_kg = 0.0;
        assert_eq!(weightless.power_to_weight(), 0.0);
        assert!(weightless.validate().is_err());
    }

    #[test]
    fn test_zftp_wkg() {
        let r = rider().with_zftp(300.0);
        assert!((r.zftp_wkg() - 4.0).abs() < 1e-12);
        assert_eq!(rider().zftp_wkg(), 0.0);

        let mut weightless = r;
        weightless.weight_kg = 0.0;
        assert_eq!(weightless.zftp_wkg(), 0.0);
    }

    #[test]
    fn test_searchable_requires_curves() {
        assert!(rider().is_searchable());
        assert!(!Rider::new("x", 70.0, 170.0).is_searchable());
    }

    #[test]
    fn test_fitted_curves_from_efforts() {
        let efforts = [
            (30.0, 520.0),
            (60.0, 450.0),
            (300.0, 330.0),
            (600.0, 305.0),
            (1200.0, 290.0),
            (2400.0, 272.0),
        ];
        let r = Rider::new("5490373", 72.0, 176.0)
            .with_fitted_curves(&efforts)
            .unwrap();
        assert!(r.is_searchable());
        assert!(r.one_hour_watts() > 240.0 && r.one_hour_watts() < 272.0);
        assert!(r.pull_capacity_watts(30.0) > r.one_hour_watts());
        assert!(r.critical_power_watts > 0.0);
    }

    #[test]
    fn test_fitted_curves_reject_single_effort() {
        let err = Rider::new("x", 70.0, 170.0)
            .with_fitted_curves(&[(60.0, 400.0)])
            .unwrap_err();
        assert!(matches!(err, PacelineError::InsufficientData(_)));
    }
}
