pub mod builtins;
pub mod format;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod scope;
pub mod traits;
pub mod units;

pub use format::{FormatOptions, Notation, format_number, format_value};
pub use interpreter::Interpreter;
pub use scope::Scope;
pub use traits::{CompiledExpr, Evaluator};
pub use units::UnitRegistry;

pub use linecalc_common::{CalcError, CalcErrorKind, Quantity, Unit, Value};

#[cfg(test)]
mod tests;
