pub mod math;
pub mod random;
pub mod stats;
pub mod trig;
mod utils;

pub use utils::{factorial, round_to_precision};

use crate::function::Function;
use linecalc_common::Value;
use std::sync::Arc;

/// Every built-in function, in registration order.
pub fn all() -> Vec<Arc<dyn Function>> {
    let mut out = Vec::new();
    math::register_builtins(&mut out);
    trig::register_builtins(&mut out);
    stats::register_builtins(&mut out);
    random::register_builtins(&mut out);
    out
}

/// Named constants, consulted after scope and before units.
pub fn constant(name: &str) -> Option<Value> {
    use std::f64::consts;
    let v = match name {
        "pi" | "PI" => Value::Numeric(consts::PI),
        "e" | "E" => Value::Numeric(consts::E),
        "tau" => Value::Numeric(consts::TAU),
        "phi" => Value::Numeric(1.618_033_988_749_895),
        "Infinity" => Value::Numeric(f64::INFINITY),
        "NaN" => Value::Numeric(f64::NAN),
        "true" => Value::Boolean(true),
        "false" => Value::Boolean(false),
        _ => return None,
    };
    Some(v)
}
