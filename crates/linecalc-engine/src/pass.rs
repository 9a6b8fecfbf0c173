//! Pass orchestrator: one full top-to-bottom recomputation of a buffer.

use linecalc_common::{CalcError, Value};
use linecalc_eval::{CompiledExpr, Evaluator, Interpreter};
use rustc_hash::FxHashMap;

#[cfg(feature = "tracing")]
use tracing::{debug, info_span, warn};

use crate::aggregate::RunningStats;
use crate::clock::{ClockProvider, default_clock};
use crate::document::TextBuffer;
use crate::error::EngineResult;
use crate::fallback::FallbackContext;
use crate::format::{Formatted, format_result};
use crate::preprocess::{is_blank, preprocess};
use crate::result::LineResult;
use crate::scope::LineScope;
use crate::settings::Settings;
use crate::store::{SessionStore, Snapshot, push_history};

/// Compiled expressions kept before the cache is dropped and refilled.
const COMPILE_CACHE_LIMIT: usize = 4096;

/// Drives passes over a buffer. Holds only state that outlives a pass: the
/// evaluator, the clock, the compile cache, the session store and history.
pub struct Engine<E: Evaluator = Interpreter> {
    evaluator: E,
    clock: Box<dyn ClockProvider>,
    cache: FxHashMap<String, CompiledExpr>,
    store: Option<Box<dyn SessionStore>>,
    history: Vec<String>,
}

impl Engine<Interpreter> {
    pub fn new() -> Self {
        Engine::with_evaluator(Interpreter::new())
    }
}

impl Default for Engine<Interpreter> {
    fn default() -> Self {
        Engine::new()
    }
}

/// Pass-local mutable state with a single writer.
struct PassState {
    scope: LineScope,
    stats: RunningStats,
}

impl<E: Evaluator> Engine<E> {
    pub fn with_evaluator(evaluator: E) -> Self {
        Engine {
            evaluator,
            clock: default_clock(),
            cache: FxHashMap::default(),
            store: None,
            history: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl ClockProvider + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_store(mut self, store: impl SessionStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Mutable evaluator access, e.g. to register currency rates. Cached
    /// compilations stay valid since they are scope- and unit-independent.
    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn set_history(&mut self, history: Vec<String>) {
        self.history = history;
    }

    /// Read the snapshot from the attached store, if any, and continue its
    /// history. The caller decides what to do with the saved buffer.
    pub fn resume(&mut self) -> EngineResult<Option<Snapshot>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };
        let snapshot = store.restore()?;
        if let Some(snapshot) = &snapshot {
            self.history = snapshot.history.clone();
        }
        Ok(snapshot)
    }

    /// Recompute every line of `buffer` from scratch, then persist a
    /// snapshot to the attached store.
    pub fn run_pass<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        settings: &Settings,
    ) -> Vec<LineResult> {
        let results = self.evaluate_buffer(buffer, settings);
        self.persist(buffer.text(), &results);
        results
    }

    /// [`Engine::run_pass`] without touching the store.
    pub fn evaluate_buffer<B: TextBuffer + ?Sized>(
        &mut self,
        buffer: &B,
        settings: &Settings,
    ) -> Vec<LineResult> {
        let count = buffer.line_count();
        #[cfg(feature = "tracing")]
        let _span = info_span!("run_pass", lines = count).entered();

        let mut state = PassState {
            scope: LineScope::begin(self.clock.now(), settings),
            stats: RunningStats::new(),
        };
        let mut results = Vec::with_capacity(count);
        let mut previous_blank = true;
        for index in 0..count {
            let raw = buffer.line(index).unwrap_or("");
            let result = self.evaluate_line(raw, index, previous_blank, &mut state, settings);
            state.scope.sync_aggregates(&state.stats);
            results.push(result);
            previous_blank = is_blank(raw);
        }
        results
    }

    fn evaluate_line(
        &mut self,
        raw: &str,
        index: usize,
        previous_blank: bool,
        state: &mut PassState,
        settings: &Settings,
    ) -> LineResult {
        if is_blank(raw) {
            state.stats.block_boundary();
            return LineResult::Empty;
        }

        let expr = preprocess(raw, previous_blank, state.scope.scope(), settings);
        let outcome = match self.evaluate_primary(&expr, state) {
            Ok(value) => Ok(Some(value)),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                debug!(line = index + 1, error = %_err, "falling back");
                let ctx = FallbackContext {
                    evaluator: &self.evaluator,
                    stats: &state.stats,
                    settings,
                };
                ctx.resolve(&expr, &mut state.scope)
            }
        };

        match outcome {
            Ok(Some(value)) => self.record(value, &expr, index, state, settings),
            Ok(None) => {
                state.stats.block_boundary();
                LineResult::Empty
            }
            Err(err) if settings.line_errors => LineResult::error(index, &err.to_string()),
            Err(_) => LineResult::Empty,
        }
    }

    fn evaluate_primary(&mut self, expr: &str, state: &mut PassState) -> Result<Value, CalcError> {
        if let Some(compiled) = self.cache.get(expr) {
            return compiled.evaluate(&self.evaluator, state.scope.scope_mut());
        }
        let compiled = self.evaluator.compile(expr)?;
        let value = compiled.evaluate(&self.evaluator, state.scope.scope_mut());
        if self.cache.len() >= COMPILE_CACHE_LIMIT {
            self.cache.clear();
        }
        self.cache.insert(expr.to_string(), compiled);
        value
    }

    fn record(
        &self,
        value: Value,
        expr: &str,
        index: usize,
        state: &mut PassState,
        settings: &Settings,
    ) -> LineResult {
        match format_result(&self.evaluator, &value, expr, settings) {
            Formatted::Plot { expression } => {
                state.stats.record(&Value::Textual(expression.clone()));
                state
                    .scope
                    .record_answer(index, Value::Textual(expression.clone()));
                LineResult::Plot { expression }
            }
            Formatted::Text { display, copy_text } => {
                state.stats.record(&value);
                state.scope.record_answer(index, value.clone());
                LineResult::Value {
                    value,
                    display,
                    copy_text,
                }
            }
        }
    }

    fn persist(&mut self, text: String, results: &[LineResult]) {
        let Some(store) = &self.store else {
            return;
        };
        push_history(&mut self.history, &text);
        let snapshot = Snapshot::new(text, results, self.history.clone());
        if let Err(_err) = store.persist(&snapshot) {
            #[cfg(feature = "tracing")]
            warn!(error = %_err, "failed to persist session snapshot");
        }
    }
}
