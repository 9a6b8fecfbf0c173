use std::sync::Arc;

use linecalc_common::Value;

use super::common::{engine, last_shown, run, run_with, shown};
use crate::error::{EngineError, EngineResult};
use crate::result::LineResult;
use crate::settings::Settings;
use crate::store::{MemoryStore, SavedResult, SessionStore, Snapshot};

#[test]
fn repeated_passes_are_identical() {
    let text = "a = 3\n2a\n\nRent: 1200\n10% of 50\ntoday + 1 day\nf(x) = x^2\nfoo\ntotal";
    let mut engine = engine();
    let first = engine.run_pass(text, &Settings::default());
    let second = engine.run_pass(text, &Settings::default());
    assert_eq!(first, second);
    assert_eq!(first.len(), 9);
}

#[test]
fn answer_carries_to_next_line() {
    assert_eq!(shown(&run("2+2\nans*2")), ["4", "8"]);
    assert_eq!(shown(&run("3\n_ + 1")), ["3", "4"]);
}

#[test]
fn percent_of_sugar() {
    assert_eq!(last_shown("10% of 50"), "5");
    assert_eq!(last_shown("20%50"), "20");
    assert_eq!(last_shown("50%"), "0.5");
}

#[test]
fn total_sums_numeric_lines() {
    assert_eq!(last_shown("1\n2\n3\ntotal"), "6");
    assert_eq!(last_shown("1\n2\n3\navg"), "2");
}

#[test]
fn blank_line_starts_a_new_subtotal() {
    assert_eq!(last_shown("1\n2\n\n3\nsubtotal"), "3");
    assert_eq!(last_shown("1\n2\n// comment only\n3\nsubtotal"), "3");
    assert_eq!(last_shown("1\n2\n\n3\ntotal"), "6");
}

#[test]
fn non_numeric_answer_makes_avg_unavailable() {
    assert_eq!(last_shown("1\n\"hello\"\n2\navg"), "n/a");
    assert_eq!(last_shown("today\n5\n7\navg"), "n/a");
    assert_eq!(last_shown("1\n5 km\n2\ntotal"), "n/a");
    // Only a block boundary revives the subtotal.
    assert_eq!(last_shown("\"x\"\n1\nsubtotal"), "n/a");
    assert_eq!(last_shown("\"x\"\n\n1\nsubtotal"), "1");
}

#[test]
fn function_definition_is_a_plot() {
    let results = run("f(x) = sin(x)\nans\nf(0)");
    assert_eq!(
        results[0],
        LineResult::Plot {
            expression: "f(x) = sin(x)".into()
        }
    );
    assert_eq!(
        results[1],
        LineResult::Plot {
            expression: "f(x) = sin(x)".into()
        }
    );
    assert_eq!(results[2].display(), Some("0"));
}

#[test]
fn multi_parameter_functions_are_values() {
    let results = run("g(a, b) = a * b\ng(3, 4)");
    assert_eq!(results[0].display(), Some("g(a, b) = a * b"));
    assert_eq!(results[1].display(), Some("12"));
}

#[test]
fn continuation_prepends_previous_answer() {
    assert_eq!(shown(&run("2\n+5")), ["2", "7"]);
    assert_eq!(shown(&run("10\n*3\n-5")), ["10", "30", "25"]);
    // Not below a blank line.
    assert_eq!(shown(&run("2\n\n+5")), ["2", "", "5"]);
}

#[test]
fn continuation_disabled_evaluates_literally() {
    let off = Settings {
        cont_prev_line: false,
        ..Settings::default()
    };
    assert_eq!(shown(&run_with("2\n+5", &off)), ["2", "5"]);
    let results = run_with("2\n*3", &off);
    assert!(matches!(results[1], LineResult::Error { line: 2, .. }));
}

#[test]
fn reference_to_failed_line_is_an_error() {
    let results = run("1\n2\nfoo\nline3 + 1\nline2 * 10");
    assert_eq!(
        results[2],
        LineResult::Error {
            line: 3,
            message: "Undefined symbol foo".into()
        }
    );
    assert_eq!(
        results[3],
        LineResult::Error {
            line: 4,
            message: "Undefined symbol line3".into()
        }
    );
    assert_eq!(results[4].display(), Some("20"));
}

#[test]
fn error_lines_are_not_block_boundaries() {
    assert_eq!(last_shown("1\nfoo\n2\nsubtotal"), "3");
    assert_eq!(last_shown("1\nfoo\n2\navg"), "1.5");
}

#[test]
fn hidden_errors_render_empty() {
    let quiet = Settings {
        line_errors: false,
        ..Settings::default()
    };
    assert_eq!(run_with("1\nfoo\n2", &quiet)[1], LineResult::Empty);
    assert_eq!(shown(&run_with("1\nfoo\n2\ntotal", &quiet))[3], "3");
}

#[test]
fn labels_comments_and_currency() {
    assert_eq!(
        shown(&run("Rent: 1200\nFood: 300 // weekly\ntotal")),
        ["1,200", "300", "1,500"]
    );
    assert_eq!(last_shown("$5 + $10"), "15 USD");
    assert_eq!(shown(&run("Groceries:\n4")), ["", "4"]);
}

#[test]
fn label_only_line_is_a_block_boundary() {
    assert_eq!(last_shown("1\n2\nGroceries:\n3\nsubtotal"), "3");
}

#[test]
fn labelled_unit_arithmetic_keeps_its_units() {
    assert_eq!(
        shown(&run(
            "3 days + 4 hours\nTrip: 3 days + 4 hours\nTrip: 5 hours - 30 minutes"
        )),
        ["3.1667 days", "3.1667 days", "4.5 hours"]
    );
}

#[test]
fn integer_overflow_is_a_line_error() {
    let results = run("gcd(-1e19, 2)\n\n7");
    assert!(matches!(results[0], LineResult::Error { line: 1, .. }));
    assert_eq!(results[2].display(), Some("7"));
}

#[test]
fn deeply_nested_lines_do_not_abort_the_pass() {
    let deep = format!("{}1{}", "(".repeat(1000), ")".repeat(1000));
    let results = run(&format!("{deep}\n\n2"));
    assert_eq!(results.len(), 3);
    assert_eq!(results[2].display(), Some("2"));
}

#[test]
fn currency_substitution_can_be_disabled() {
    let off = Settings {
        currency: false,
        ..Settings::default()
    };
    assert!(matches!(
        run_with("$5", &off)[0],
        LineResult::Error { line: 1, .. }
    ));
}

#[test]
fn comma_decimal_locale() {
    let de = Settings {
        locale: "de-DE".into(),
        ..Settings::default()
    };
    assert_eq!(
        shown(&run_with("1,5 * 2\n1234,5\nmax(1; 2,5)", &de)),
        ["3", "1.234,5", "2,5"]
    );
    assert_eq!(shown(&run_with("[1,5; 2]", &de)), ["[[1,5], [2]]"]);
}

#[test]
fn dates_and_clock() {
    assert_eq!(
        shown(&run("today\nnow\ntoday + 3 days\nnow + 2 hours\nsoon + 1 day")),
        [
            "10/15/2026",
            "10/15/2026 09:30 AM",
            "10/18/2026",
            "10/15/2026 11:30 AM",
            "Invalid Date"
        ]
    );
}

#[test]
fn infinity_and_zero_are_values() {
    assert_eq!(
        shown(&run("1/0\n\n-1/0\n\n0 * 3")),
        ["Infinity", "", "-Infinity", "", "0"]
    );
}

#[test]
fn unbalanced_parentheses_fail() {
    let results = run("(1 + 2");
    match &results[0] {
        LineResult::Error { line, message } => {
            assert_eq!(*line, 1);
            assert!(message.starts_with("Unbalanced parentheses"), "{message}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[test]
fn values_are_kept_on_results() {
    let results = run("6 * 7\n1200 km");
    assert_eq!(results[0].value(), Some(&Value::Numeric(42.0)));
    assert_eq!(results[1].display(), Some("1,200 km"));
    assert_eq!(results[1].copy_text(), Some("1200 km"));
}

#[test]
fn snapshots_are_persisted_after_each_pass() {
    let store = Arc::new(MemoryStore::new());
    let mut engine = engine().with_store(store.clone());
    engine.run_pass("1\n2", &Settings::default());
    engine.run_pass("1\n2", &Settings::default());
    engine.run_pass("1\n3", &Settings::default());

    let snapshot = store.restore().unwrap().unwrap();
    assert_eq!(snapshot.buffer_text, "1\n3");
    assert_eq!(snapshot.history, ["1\n2", "1\n3"]);
    assert_eq!(
        snapshot.results[1],
        SavedResult::Value {
            display: "3".into(),
            copy_text: "3".into()
        }
    );
}

struct FailingStore;

impl SessionStore for FailingStore {
    fn persist(&self, _: &Snapshot) -> EngineResult<()> {
        Err(EngineError::Io(std::io::Error::other("disk full")))
    }

    fn restore(&self) -> EngineResult<Option<Snapshot>> {
        Ok(None)
    }
}

#[test]
fn persist_failures_do_not_affect_results() {
    let mut engine = engine().with_store(FailingStore);
    assert_eq!(shown(&engine.run_pass("2+2", &Settings::default())), ["4"]);
}

#[test]
fn cached_and_fresh_compilations_agree() {
    let text = "x = 2\nx * 3\nx = 5\nx * 3";
    let mut warm = engine();
    warm.run_pass(text, &Settings::default());
    let cached = warm.run_pass(text, &Settings::default());
    assert_eq!(cached, run(text));
    assert_eq!(shown(&cached), ["2", "6", "5", "15"]);
}
