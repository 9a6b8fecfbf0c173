//! Volatile functions: `random()`, `random(max)`, `random(min, max)`.
use super::utils::coerce_num;
use crate::function::{FnCaps, Function};
use linecalc_common::{CalcError, Value};
use rand::Rng;
use std::sync::Arc;

#[derive(Debug)]
pub struct RandomFn;

impl Function for RandomFn {
    fn name(&self) -> &'static str {
        "random"
    }

    fn caps(&self) -> FnCaps {
        FnCaps::VOLATILE
    }

    fn min_args(&self) -> usize {
        0
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }

    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let (lo, hi) = match args {
            [] => (0.0, 1.0),
            [max] => (0.0, coerce_num(max, "random")?),
            [min, max, ..] => (coerce_num(min, "random")?, coerce_num(max, "random")?),
        };
        let r: f64 = rand::thread_rng().r#gen();
        Ok(Value::Numeric(lo + r * (hi - lo)))
    }
}

pub fn register_builtins(out: &mut Vec<Arc<dyn Function>>) {
    out.push(Arc::new(RandomFn));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_in_range() {
        for _ in 0..100 {
            let v = RandomFn
                .dispatch(&[5.0.into(), 6.0.into()])
                .unwrap()
                .as_number()
                .unwrap();
            assert!((5.0..6.0).contains(&v));
        }
    }
}
