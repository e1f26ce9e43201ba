//! Shared test fixtures for paceline crates.
//!
//! This crate provides rider and request fixtures with known power profiles.
//!
//! - [`riders`] - Individual riders and ready-made teams
//! - [`requests`] - Planning requests built from those teams
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! paceline-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```
//! use paceline_test::riders::{rider, three_rider_team};
//!
//! let team = three_rider_team();
//! assert_eq!(team.len(), 3);
//! assert!((rider("x", 250.0, 70.0).one_hour_watts() - 250.0).abs() < 1e-9);
//! ```

pub mod requests;
pub mod riders;

pub use requests::request;
pub use riders::{five_rider_team, rider, seven_rider_team, three_rider_team};
