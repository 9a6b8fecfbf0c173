use chrono::NaiveDate;

use crate::clock::FixedClock;
use crate::pass::Engine;
use crate::result::LineResult;
use crate::settings::Settings;

pub fn fixed_clock() -> FixedClock {
    FixedClock::new(
        NaiveDate::from_ymd_opt(2026, 10, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap(),
    )
}

pub fn engine() -> Engine {
    Engine::new().with_clock(fixed_clock())
}

pub fn run(text: &str) -> Vec<LineResult> {
    run_with(text, &Settings::default())
}

pub fn run_with(text: &str, settings: &Settings) -> Vec<LineResult> {
    engine().run_pass(text, settings)
}

/// Display text per line: answers as shown, errors as `error: …`, plots as
/// `plot: …`, empty lines as `""`.
pub fn shown(results: &[LineResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| match r {
            LineResult::Empty => String::new(),
            LineResult::Value { display, .. } => display.clone(),
            LineResult::Error { message, .. } => format!("error: {message}"),
            LineResult::Plot { expression } => format!("plot: {expression}"),
        })
        .collect()
}

pub fn last_shown(text: &str) -> String {
    shown(&run(text)).pop().unwrap_or_default()
}
