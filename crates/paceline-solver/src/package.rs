//! The result of a planning request.

use std::collections::BTreeMap;

use paceline_core::{PacelineComputationReport, PlanCategory};
use serde::Serialize;

use crate::statistics::SearchStatistics;

/// Named plans plus the statistics of the search that produced them.
///
/// Check [`algorithm_ran_to_completion`](Self::algorithm_ran_to_completion)
/// before using the reports: an incomplete package carries reports with no
/// contributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PacelineSolutionsPackage {
    pub reports: BTreeMap<PlanCategory, PacelineComputationReport>,
    pub statistics: SearchStatistics,
    pub algorithm_ran_to_completion: bool,
}

impl PacelineSolutionsPackage {
    /// A package for a request with nothing to search: every full-team
    /// category maps to an incomplete report.
    pub fn incomplete(pull_durations: &[f64], statistics: SearchStatistics) -> Self {
        let reports = PlanCategory::ALL
            .iter()
            .filter(|category| category.strongest_riders().is_none())
            .map(|&category| {
                (
                    category,
                    PacelineComputationReport::incomplete(pull_durations.to_vec(), 0),
                )
            })
            .collect();
        Self {
            reports,
            statistics,
            algorithm_ran_to_completion: false,
        }
    }

    pub fn get(&self, category: PlanCategory) -> Option<&PacelineComputationReport> {
        self.reports.get(&category)
    }

    /// Categories present, in declaration order.
    pub fn categories(&self) -> impl Iterator<Item = PlanCategory> + '_ {
        self.reports.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_package() {
        let package = PacelineSolutionsPackage::incomplete(&[30.0, 60.0], SearchStatistics::default());
        assert!(!package.algorithm_ran_to_completion);
        assert_eq!(package.len(), 5);
        assert!(package.get(PlanCategory::FastestLastFive).is_none());

        let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
        assert!(!fastest.algorithm_ran_to_completion);
        assert!(fastest.contributions.is_empty());
    }

    #[test]
    fn test_categories_in_declaration_order() {
        let package = PacelineSolutionsPackage::incomplete(&[30.0], SearchStatistics::default());
        let categories: Vec<_> = package.categories().collect();
        assert_eq!(categories[0], PlanCategory::ThirtySecondPull);
        assert_eq!(categories[4], PlanCategory::FastestFullTeam);
    }
}
