//! End-to-end planning from configuration text to named plans.

use paceline::prelude::*;
use paceline::PacelineError;
use paceline_test::{five_rider_team, request, three_rider_team};

const TEAM: &str = r#"
[[riders]]
id = "alice"
name = "Alice"
weight_kg = 75.0
height_cm = 178.0
gender = "female"
one_hour_curve = { coefficient = 532.2, exponent = -0.07 }
pull_curve = { coefficient = 626.9, exponent = -0.09 }

[[riders]]
id = "bruno"
name = "Bruno"
weight_kg = 70.0
height_cm = 175.0
gender = "male"
one_hour_curve = { coefficient = 496.7, exponent = -0.07 }
pull_curve = { coefficient = 585.1, exponent = -0.09 }

[[riders]]
id = "chloe"
weight_kg = 65.0
height_cm = 170.0
one_hour_curve = { coefficient = 443.5, exponent = -0.07 }
pull_curve = { coefficient = 522.4, exponent = -0.09 }

[[riders]]
id = "newbie"
weight_kg = 80.0
height_cm = 180.0
"#;

const PLANNER: &str = r#"
max_intensity_factor = 1.0
pull_durations = [30, 60]

[search]
thread_count = { specific = 2 }
parallel_threshold = 4

[search.strategy]
type = "chunked"
chunk_size = 2
"#;

#[test]
fn test_plan_from_configuration() {
    let roster = Roster::from_toml_str(TEAM).unwrap();
    roster.validate().unwrap();
    let config = PlannerConfig::from_toml_str(PLANNER).unwrap();

    let package = paceline::plan(&config, roster.riders.clone()).unwrap();
    assert!(package.algorithm_ran_to_completion);

    let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
    assert_eq!(fastest.rider_count(), 3);
    assert!(fastest.contribution("newbie").is_none());
    assert!(fastest.speed_kph > 42.0 && fastest.speed_kph < 45.0);

    let lower = paceline::bounds::lower_bound(&roster.searchable())
        .unwrap()
        .unwrap();
    assert!(fastest.speed_kph > lower.speed_kph);
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let roster = Roster::from_toml_str(TEAM).unwrap();
    let mut config = PlannerConfig::from_toml_str(PLANNER).unwrap();
    config.speed_search.tolerance_kph = 0.0;

    let result = paceline::plan(&config, roster.riders.clone());
    match result {
        Err(PacelineError::InvalidInput(message)) => {
            assert!(message.contains("tolerance_kph"));
        }
        other => panic!("expected invalid input, got {other:?}"),
    }

    let mut config = PlannerConfig::default().with_pull_durations([30.0, 60.0]);
    config.selection.balance_speed_tolerance_kph = -1.0;
    assert!(matches!(
        paceline::plan(&config, roster.riders),
        Err(PacelineError::InvalidInput(_))
    ));
}

#[test]
fn test_selected_riders_from_roster() {
    let roster = Roster::from_toml_str(TEAM).unwrap();
    let team = roster.select(&["chloe", "alice"]).unwrap();
    assert_eq!(team[0].id, "chloe");
    assert!(roster.select(&["alice", "nobody"]).is_none());

    let config = PlannerConfig::default().with_pull_durations([30.0, 60.0]);
    let package = paceline::plan(&config, team).unwrap();
    let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
    assert_eq!(fastest.contributions[0].rider_id, "chloe");
}

#[test]
fn test_top_level_operations() {
    let package =
        paceline::generate_plan_package(&request(three_rider_team(), &[30.0, 60.0], 1.0)).unwrap();
    let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
    assert!(fastest.contributions.iter().all(|c| !c.is_violated()));

    let report =
        paceline::generate_fastest_for_n_strongest(&request(five_rider_team(), &[30.0, 60.0], 0.95), 2)
            .unwrap();
    let mut ids: Vec<&str> = report.contributions.iter().map(|c| c.rider_id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["dave", "erin"]);
}

#[test]
fn test_fitted_rider_joins_plan() {
    let efforts = [
        (30.0, 425.0),
        (300.0, 292.0),
        (1200.0, 254.0),
        (1800.0, 252.0),
        (2400.0, 244.0),
    ];
    let fitted = Rider::new("fitted", 68.0, 174.0)
        .with_fitted_curves(&efforts)
        .unwrap();
    assert!(fitted.is_searchable());

    let mut riders = three_rider_team();
    riders.push(fitted);
    let package = paceline::generate_plan_package(&request(riders, &[30.0, 60.0], 1.0)).unwrap();
    let fastest = package.get(PlanCategory::FastestFullTeam).unwrap();
    assert!(fastest.contribution("fitted").is_some());
}
