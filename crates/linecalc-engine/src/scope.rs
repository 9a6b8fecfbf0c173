//! Per-pass scope: the evaluator [`Scope`] plus the reserved names the line
//! engine maintains (`ans`/`_`, `now`, `today`, `avg`, `total`, `subtotal`,
//! `line<N>`).

use chrono::NaiveDateTime;
use linecalc_common::Value;
use linecalc_eval::Scope;

use crate::aggregate::RunningStats;
use crate::settings::Settings;

/// Rendering of an unavailable aggregate.
pub const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineScope {
    inner: Scope,
}

impl LineScope {
    /// Fresh scope for a pass started at `now`.
    pub fn begin(now: NaiveDateTime, settings: &Settings) -> Self {
        let mut inner = Scope::new();
        inner.set(
            "now",
            Value::Textual(now.format(&settings.now_format()).to_string()),
        );
        inner.set(
            "today",
            Value::Textual(now.date().format(&settings.today_format()).to_string()),
        );
        let mut scope = LineScope { inner };
        scope.sync_aggregates(&RunningStats::new());
        scope
    }

    /// Publish the answer of line `index` (0-based) as `ans`, `_` and `line<index+1>`.
    pub fn record_answer(&mut self, index: usize, value: Value) {
        self.inner.set("ans", value.clone());
        self.inner.set("_", value.clone());
        self.inner.set(line_name(index), value);
    }

    pub fn sync_aggregates(&mut self, stats: &RunningStats) {
        for (name, value) in stats.entries() {
            self.inner.set(name, aggregate_value(value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.inner.get(name)
    }

    pub fn answer(&self) -> Option<&Value> {
        self.inner.get("ans")
    }

    pub fn scope(&self) -> &Scope {
        &self.inner
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.inner
    }
}

pub fn line_name(index: usize) -> String {
    format!("line{}", index + 1)
}

pub fn aggregate_value(value: Option<f64>) -> Value {
    match value {
        Some(n) => Value::Numeric(n),
        None => Value::Textual(NOT_AVAILABLE.to_string()),
    }
}
