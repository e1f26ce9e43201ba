//! Colorful console output for paceline plan searches.
//!
//! Provides a custom `tracing` layer that formats engine events with colors.
//!
//! ## Log Levels
//!
//! - **INFO**: Search lifecycle, phase ends and selected plans
//! - **DEBUG**: Skipped riders and candidates
//! - **TRACE**: Individual candidate results

use num_format::{Locale, ToFormattedString};
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

static INIT: OnceLock<()> = OnceLock::new();
static EPOCH: OnceLock<Instant> = OnceLock::new();
static SEARCH_START_NANOS: AtomicU64 = AtomicU64::new(0);

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "paceline_solver=info";

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initializes console output.
///
/// Safe to call multiple times; only the first call has effect. Prints the
/// banner and installs the layer unless another subscriber is already set.
pub fn init() {
    INIT.get_or_init(|| {
        print_banner();

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(PacelineConsoleLayer)
            .try_init();
    });
}

fn mark_search_start() {
    let epoch = EPOCH.get_or_init(Instant::now);
    let nanos = epoch.elapsed().as_nanos() as u64;
    SEARCH_START_NANOS.store(nanos, Ordering::Relaxed);
}

fn elapsed_secs() -> f64 {
    let Some(epoch) = EPOCH.get() else {
        return 0.0;
    };
    let start_nanos = SEARCH_START_NANOS.load(Ordering::Relaxed);
    let now_nanos = epoch.elapsed().as_nanos() as u64;
    now_nanos.saturating_sub(start_nanos) as f64 / 1_000_000_000.0
}

fn print_banner() {
    let banner = r#"
 ___                _ _
| _ \__ _ __ ___ __| (_)_ _  ___
|  _/ _` / _/ -_) _| | | ' \/ -_)
|_| \__,_\__\___\__|_|_|_||_\___|
"#;
    let version_line = format!("  v{VERSION} - team time trial planner\n");

    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{}", banner.bright_cyan());
    let _ = writeln!(stdout, "{}", version_line.bright_white().bold());
    let _ = stdout.flush();
}

/// A tracing layer that formats engine events with colors.
pub struct PacelineConsoleLayer;

impl<S: Subscriber> Layer<S> for PacelineConsoleLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("paceline") {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let output = format_event(&visitor, *metadata.level());
        if !output.is_empty() {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

#[derive(Debug, Default)]
struct EventVisitor {
    event: Option<String>,
    phase: Option<String>,
    category: Option<String>,
    reason: Option<String>,
    durations: Option<String>,
    rider_count: Option<u64>,
    duration_count: Option<u64>,
    duration_ms: Option<u64>,
    nodes: Option<u64>,
    candidates: Option<u64>,
    pruned: Option<u64>,
    filtered: Option<u64>,
    feasible: Option<u64>,
    failures: Option<u64>,
    iterations: Option<u64>,
    threads: Option<u64>,
    sequences: Option<u64>,
    skipped: Option<u64>,
    max_intensity_factor: Option<f64>,
    start_speed_kph: Option<f64>,
    floor_speed_kph: Option<f64>,
    cutoff_speed_kph: Option<f64>,
    speed_kph: Option<f64>,
    dispersion: Option<f64>,
    completed: Option<bool>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let s = format!("{:?}", value);
        match field.name() {
            "event" => self.event = Some(s.trim_matches('"').to_string()),
            "phase" => self.phase = Some(s.trim_matches('"').to_string()),
            "category" => self.category = Some(s.trim_matches('"').to_string()),
            "reason" => self.reason = Some(s.trim_matches('"').to_string()),
            "durations" => self.durations = Some(s),
            _ => {}
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            "rider_count" => self.rider_count = Some(value),
            "duration_count" => self.duration_count = Some(value),
            "duration_ms" => self.duration_ms = Some(value),
            "nodes" => self.nodes = Some(value),
            "candidates" => self.candidates = Some(value),
            "pruned" => self.pruned = Some(value),
            "filtered" => self.filtered = Some(value),
            "feasible" => self.feasible = Some(value),
            "failures" => self.failures = Some(value),
            "iterations" => self.iterations = Some(value),
            "threads" => self.threads = Some(value),
            "sequences" => self.sequences = Some(value),
            "skipped" => self.skipped = Some(value),
            _ => {}
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_u64(field, value.max(0) as u64);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        match field.name() {
            "max_intensity_factor" => self.max_intensity_factor = Some(value),
            "start_speed_kph" => self.start_speed_kph = Some(value),
            "floor_speed_kph" => self.floor_speed_kph = Some(value),
            "cutoff_speed_kph" => self.cutoff_speed_kph = Some(value),
            "speed_kph" => self.speed_kph = Some(value),
            "dispersion" => self.dispersion = Some(value),
            _ => {}
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "completed" {
            self.completed = Some(value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "event" => self.event = Some(value.to_string()),
            "phase" => self.phase = Some(value.to_string()),
            "category" => self.category = Some(value.to_string()),
            "reason" => self.reason = Some(value.to_string()),
            _ => {}
        }
    }
}

fn format_event(v: &EventVisitor, level: Level) -> String {
    match v.event.as_deref().unwrap_or("") {
        "plan_search_start" => format_search_start(v),
        "plan_search_end" => format_search_end(v),
        "phase_end" => format_phase_end(v),
        "plan_selected" => format_plan_selected(v),
        "riders_skipped" | "node_limit_reached" | "pool_unavailable" => format_warning(v),
        "candidate_skipped" | "baseline_skipped" => format_skipped(v, level),
        _ => String::new(),
    }
}

fn format_elapsed() -> String {
    format!("{:>7.3}s", elapsed_secs())
        .bright_black()
        .to_string()
}

fn format_count(n: u64) -> String {
    n.to_formatted_string(&Locale::en)
}

fn format_search_start(v: &EventVisitor) -> String {
    mark_search_start();
    let riders = v.rider_count.unwrap_or(0);
    let durations = v.duration_count.unwrap_or(0);

    format!(
        "{} {} Planning │ {} riders │ {} pull durations │ IF ceiling {} │ space {}",
        format_elapsed(),
        "▶".bright_green().bold(),
        format_count(riders).bright_yellow(),
        format_count(durations).bright_yellow(),
        format!("{:.2}", v.max_intensity_factor.unwrap_or(0.0)).bright_yellow(),
        search_space(riders, durations).bright_magenta()
    )
}

fn format_search_end(v: &EventVisitor) -> String {
    let completed = v.completed.unwrap_or(false);
    let status = if completed {
        "PLANS FOUND".bright_green().bold().to_string()
    } else {
        "NO FEASIBLE PLAN".bright_red().bold().to_string()
    };

    format!(
        "{} {} Planning complete │ {} │ {} sequences │ {} rotations │ {}",
        format_elapsed(),
        "■".bright_cyan().bold(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
        format_count(v.sequences.unwrap_or(0)).white(),
        format_count(v.iterations.unwrap_or(0))
            .bright_magenta()
            .bold(),
        status
    )
}

fn format_phase_end(v: &EventVisitor) -> String {
    let phase = v.phase.as_deref().unwrap_or("unknown");
    let mut output = format!(
        "{} {} {} ended │ {}",
        format_elapsed(),
        "◀".bright_blue(),
        phase.white().bold(),
        format_duration_ms(v.duration_ms.unwrap_or(0)).yellow(),
    );

    match phase {
        "seed" => {
            if let Some(start) = v.start_speed_kph {
                output.push_str(&format!(" │ start {}", format_speed(start)));
            }
            if let Some(floor) = v.floor_speed_kph {
                output.push_str(&format!(" │ floor {}", format_speed(floor)));
            }
        }
        "enumerate" => {
            output.push_str(&format!(
                " │ {} candidates │ {} pruned │ {} filtered",
                format_count(v.candidates.unwrap_or(0)).bright_magenta().bold(),
                format_count(v.pruned.unwrap_or(0)).white(),
                format_count(v.filtered.unwrap_or(0)).white(),
            ));
            if let Some(cutoff) = v.cutoff_speed_kph {
                output.push_str(&format!(" │ cutoff {}", format_speed(cutoff)));
            }
        }
        "evaluate" => {
            output.push_str(&format!(
                " │ {} feasible │ {} failed │ {} threads",
                format_count(v.feasible.unwrap_or(0)).bright_magenta().bold(),
                format_count(v.failures.unwrap_or(0)).white(),
                v.threads.unwrap_or(1),
            ));
        }
        _ => {}
    }

    output
}

fn format_plan_selected(v: &EventVisitor) -> String {
    let category = v.category.as_deref().unwrap_or("unknown");
    if !v.completed.unwrap_or(false) {
        return format!(
            "{} {} {:<22} │ {}",
            format_elapsed(),
            "✗".bright_red(),
            category,
            "no feasible plan".bright_red()
        );
    }

    format!(
        "{} {} {:<22} │ {} │ dispersion {}",
        format_elapsed(),
        "✓".bright_green(),
        category.white().bold(),
        format_speed(v.speed_kph.unwrap_or(0.0)),
        format!("{:.3}", v.dispersion.unwrap_or(0.0)).bright_yellow()
    )
}

fn format_warning(v: &EventVisitor) -> String {
    let event = v.event.as_deref().unwrap_or("");
    let detail = match event {
        "riders_skipped" => format!("{} riders without power curves", v.skipped.unwrap_or(0)),
        "node_limit_reached" => format!(
            "node limit reached after {} nodes",
            format_count(v.nodes.unwrap_or(0))
        ),
        _ => "evaluating sequentially".to_string(),
    };
    format!(
        "{} {} {}",
        format_elapsed(),
        "!".bright_yellow().bold(),
        detail.yellow()
    )
}

fn format_skipped(v: &EventVisitor, level: Level) -> String {
    if level == Level::INFO {
        return String::new();
    }
    format!(
        "{} {} {} │ {}",
        format_elapsed(),
        "·".bright_black(),
        v.durations.as_deref().unwrap_or("?").bright_black(),
        v.reason.as_deref().unwrap_or("").bright_black()
    )
}

fn format_speed(kph: f64) -> String {
    format!("{:.2} kph", kph).bright_green().bold().to_string()
}

fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        format!("{:.2}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60_000;
        let secs = (ms % 60_000) / 1000;
        format!("{}m {}s", mins, secs)
    }
}

// d^n written as a formatted integer when small, scientific otherwise.
fn search_space(riders: u64, durations: u64) -> String {
    if riders == 0 || durations == 0 {
        return "0".to_string();
    }
    if let Some(exact) = u32::try_from(riders)
        .ok()
        .and_then(|n| durations.checked_pow(n))
    {
        return format_count(exact);
    }

    let log_scale = (riders as f64) * (durations as f64).log10();
    let exponent = log_scale.floor() as i32;
    let mantissa = 10f64.powf(log_scale - exponent as f64);
    format!("{:.3} x 10^{}", mantissa, exponent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ms() {
        assert_eq!(format_duration_ms(250), "250ms");
        assert_eq!(format_duration_ms(1500), "1.50s");
        assert_eq!(format_duration_ms(125_000), "2m 5s");
    }

    #[test]
    fn test_search_space() {
        assert_eq!(search_space(0, 5), "0");
        assert_eq!(search_space(7, 5), "78,125");
        assert_eq!(search_space(40, 9), "1.478 x 10^38");
    }

    #[test]
    fn test_phase_end_fields() {
        let visitor = EventVisitor {
            event: Some("phase_end".to_string()),
            phase: Some("enumerate".to_string()),
            duration_ms: Some(12),
            candidates: Some(1_024),
            pruned: Some(3),
            cutoff_speed_kph: Some(41.82),
            ..EventVisitor::default()
        };
        let output = format_event(&visitor, Level::INFO);
        assert!(output.contains("enumerate"));
        assert!(output.contains("1,024"));
        assert!(output.contains("12ms"));
        assert!(output.contains("cutoff"));
        assert!(output.contains("41.82 kph"));
    }

    #[test]
    fn test_plan_selected() {
        let visitor = EventVisitor {
            event: Some("plan_selected".to_string()),
            category: Some("fastest_full_team".to_string()),
            speed_kph: Some(43.148),
            dispersion: Some(0.0171),
            completed: Some(true),
            ..EventVisitor::default()
        };
        let output = format_event(&visitor, Level::INFO);
        assert!(output.contains("fastest_full_team"));
        assert!(output.contains("43.15 kph"));
        assert!(output.contains("0.017"));

        let incomplete = EventVisitor {
            completed: Some(false),
            ..visitor
        };
        assert!(format_event(&incomplete, Level::INFO).contains("no feasible plan"));
    }

    #[test]
    fn test_skipped_only_below_info() {
        let visitor = EventVisitor {
            event: Some("candidate_skipped".to_string()),
            reason: Some("did not converge".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(&visitor, Level::INFO).is_empty());
        assert!(format_event(&visitor, Level::DEBUG).contains("did not converge"));
    }

    #[test]
    fn test_unknown_event_is_silent() {
        let visitor = EventVisitor {
            event: Some("something_else".to_string()),
            ..EventVisitor::default()
        };
        assert!(format_event(&visitor, Level::INFO).is_empty());
    }
}
