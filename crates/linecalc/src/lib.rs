//! Meta crate that re-exports the linecalc layers with sensible defaults.
//! Depend on this crate and opt into specific layers via feature flags, or
//! reach for the underlying crates when deeper integration is required.

#[cfg(feature = "common")]
pub use linecalc_common as common;

#[cfg(feature = "parse")]
pub use linecalc_parse as parse;

#[cfg(feature = "eval")]
pub use linecalc_eval as eval;

#[cfg(feature = "engine")]
pub use linecalc_engine as engine;

#[cfg(feature = "eval")]
pub use linecalc_eval::{Evaluator, Interpreter, Scope, Value};

#[cfg(feature = "engine")]
pub use linecalc_engine::{
    Document, Engine, FixedClock, LineResult, Notepad, SessionStore, Settings, TextBuffer,
};

#[cfg(feature = "system-clock")]
pub use linecalc_engine::SystemClock;
