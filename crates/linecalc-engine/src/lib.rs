//! Incremental line-by-line evaluation for a calculator notepad.
//!
//! A pass turns a text buffer into one [`LineResult`] per line, threading a
//! [`LineScope`] and [`RunningStats`] from top to bottom. Lines that do not
//! evaluate as written go through the [`fallback`] rewrite pipeline.

pub mod aggregate;
pub mod clock;
pub mod document;
pub mod error;
pub mod fallback;
pub mod format;
pub mod locale;
pub mod notepad;
pub mod pass;
pub mod preprocess;
pub mod result;
pub mod scope;
pub mod settings;
pub mod store;

pub use aggregate::RunningStats;
#[cfg(feature = "system-clock")]
pub use clock::SystemClock;
pub use clock::{ClockProvider, FixedClock};
pub use document::{Document, TextBuffer};
pub use error::{EngineError, EngineResult};
pub use locale::NumberLocale;
pub use notepad::Notepad;
pub use pass::Engine;
pub use result::LineResult;
pub use scope::LineScope;
pub use settings::Settings;
pub use store::{JsonFileStore, MemoryStore, SessionStore, Snapshot};

#[cfg(test)]
mod tests;
