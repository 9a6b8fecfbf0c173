//! A buffer wired to an engine: every edit triggers a new pass.

use linecalc_eval::{Evaluator, Interpreter};

use crate::document::{Document, TextBuffer};
use crate::error::EngineResult;
use crate::pass::Engine;
use crate::result::LineResult;
use crate::settings::Settings;
use crate::store::SessionStore;

pub struct Notepad<E: Evaluator = Interpreter> {
    document: Document,
    engine: Engine<E>,
    settings: Settings,
    results: Vec<LineResult>,
}

impl Notepad<Interpreter> {
    pub fn new(settings: Settings) -> Self {
        Notepad::with_engine(Engine::new(), settings)
    }
}

impl<E: Evaluator> Notepad<E> {
    /// Starts on an empty buffer. The initial pass is not persisted, so a
    /// store attached to `engine` keeps its previous snapshot until the
    /// first edit.
    pub fn with_engine(mut engine: Engine<E>, settings: Settings) -> Self {
        let document = Document::new();
        let results = engine.evaluate_buffer(&document, &settings);
        Notepad {
            document,
            engine,
            settings,
            results,
        }
    }

    /// Open on the snapshot saved in the engine's own store, falling back to
    /// an empty buffer when there is none.
    pub fn resume(engine: Engine<E>, settings: Settings) -> EngineResult<Self> {
        let mut notepad = Notepad::with_engine(engine, settings);
        if let Some(snapshot) = notepad.engine.resume()? {
            notepad.document.set_text(&snapshot.buffer_text);
            notepad.results = notepad
                .engine
                .evaluate_buffer(&notepad.document, &notepad.settings);
        }
        Ok(notepad)
    }

    /// Load the buffer and history saved in `store`, if any, then recompute.
    /// Returns whether a snapshot was found.
    pub fn restore_from(&mut self, store: &dyn SessionStore) -> EngineResult<bool> {
        let Some(snapshot) = store.restore()? else {
            return Ok(false);
        };
        self.engine.set_history(snapshot.history);
        self.set_text(&snapshot.buffer_text);
        Ok(true)
    }

    pub fn recalculate(&mut self) -> &[LineResult] {
        self.results = self.engine.run_pass(&self.document, &self.settings);
        &self.results
    }

    pub fn set_text(&mut self, text: &str) -> &[LineResult] {
        self.document.set_text(text);
        self.recalculate()
    }

    /// Returns `None` when `index` is out of range.
    pub fn edit_line(&mut self, index: usize, text: &str) -> Option<&[LineResult]> {
        if !self.document.edit_line(index, text) {
            return None;
        }
        Some(self.recalculate())
    }

    pub fn insert_line(&mut self, index: usize, text: &str) -> Option<&[LineResult]> {
        if !self.document.insert_line(index, text) {
            return None;
        }
        Some(self.recalculate())
    }

    pub fn remove_line(&mut self, index: usize) -> Option<&[LineResult]> {
        self.document.remove_line(index)?;
        Some(self.recalculate())
    }

    pub fn set_settings(&mut self, settings: Settings) -> &[LineResult] {
        self.settings = settings;
        self.recalculate()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn engine(&self) -> &Engine<E> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine<E> {
        &mut self.engine
    }

    pub fn results(&self) -> &[LineResult] {
        &self.results
    }

    /// `line = answer` for every answered line, other lines as typed.
    pub fn copy_all(&self) -> String {
        (0..self.document.line_count())
            .map(|i| {
                let line = self.document.line(i).unwrap_or("");
                match self.results.get(i).and_then(LineResult::copy_text) {
                    Some(answer) => format!("{} = {answer}", line.trim_end()),
                    None => line.to_string(),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
