//! Planning requests.

use paceline_core::{PacelineIngredients, Rider};

/// A request with no explicit seed speed.
pub fn request(
    riders: Vec<Rider>,
    pull_durations: &[f64],
    max_intensity_factor: f64,
) -> PacelineIngredients {
    PacelineIngredients::new(riders, pull_durations.to_vec(), max_intensity_factor)
}
