//! Riders with power profiles pinned to a chosen one-hour power.

use paceline_core::{PowerCurve, Rider};

/// Decay exponent of the sustained-power curve.
pub const ONE_HOUR_EXPONENT: f64 = -0.07;
/// Decay exponent of the pull curve. Steeper, so short pulls are stronger.
pub const PULL_EXPONENT: f64 = -0.09;

/// A rider of height 175 cm whose curves both pass through `one_hour_watts` at one hour.
pub fn rider(id: &str, one_hour_watts: f64, weight_kg: f64) -> Rider {
    rider_with_height(id, one_hour_watts, weight_kg, 175.0)
}

pub fn rider_with_height(id: &str, one_hour_watts: f64, weight_kg: f64, height_cm: f64) -> Rider {
    let one_hour = PowerCurve::new(
        one_hour_watts / 3600f64.powf(ONE_HOUR_EXPONENT),
        ONE_HOUR_EXPONENT,
    );
    let pull = PowerCurve::new(one_hour_watts / 3600f64.powf(PULL_EXPONENT), PULL_EXPONENT);
    Rider::new(id, weight_kg, height_cm)
        .with_one_hour_curve(one_hour)
        .with_pull_curve(pull)
        .with_zftp(one_hour_watts * 1.03)
}

/// Three riders: 300 W / 75 kg, 280 W / 70 kg, 250 W / 65 kg.
pub fn three_rider_team() -> Vec<Rider> {
    vec![
        rider_with_height("alice", 300.0, 75.0, 178.0),
        rider_with_height("bruno", 280.0, 70.0, 175.0),
        rider_with_height("chloe", 250.0, 65.0, 170.0),
    ]
}

/// Five riders with distinct power-to-weight ratios.
///
/// Ranked by W/kg: erin (4.27), dave (4.00), alice (3.79), carl (3.38), bea (3.29).
pub fn five_rider_team() -> Vec<Rider> {
    vec![
        rider("alice", 280.0, 74.0),
        rider("bea", 230.0, 70.0),
        rider("carl", 270.0, 80.0),
        rider("dave", 300.0, 75.0),
        rider("erin", 235.0, 55.0),
    ]
}

/// Seven riders, enough for last-five and last-four plans.
pub fn seven_rider_team() -> Vec<Rider> {
    let mut team = five_rider_team();
    team.push(rider("fred", 250.0, 82.0));
    team.push(rider("gina", 215.0, 60.0));
    team
}
