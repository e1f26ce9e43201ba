//! Core types and numeric models for paceline planning.
//!
//! This crate provides:
//! - Rider records with fitted power profiles ([`Rider`])
//! - Duration to power curve fitting ([`power_curve`])
//! - Speed and power conversion with draft ratios ([`physics`])
//! - Plan data: assignments, exertions, contributions, reports
//! - The error taxonomy ([`PacelineError`])
//!
//! Everything here is pure. No logging, no I/O.

pub mod error;
pub mod ingredients;
pub mod physics;
pub mod plan;
pub mod power_curve;
pub mod rider;

pub use error::{PacelineError, Result};
pub use ingredients::PacelineIngredients;
pub use plan::{
    PacelineComputationReport, PlanCategory, RiderContribution, RiderExertion,
    RiderWorkAssignment,
};
pub use power_curve::{CriticalPowerFit, CurveFit, PowerCurve};
pub use rider::{Gender, Rider};
