//! Reductions over argument lists and matrices: `sum`, `prod`, `min`, `max`,
//! `mean`, `median`.

use super::utils::reduce_values;
use crate::function::{FnCaps, Function};
use linecalc_common::{CalcError, Value};
use std::sync::Arc;

macro_rules! reduction_fn {
    ($ty:ident, $name:literal, $reduce:expr) => {
        #[derive(Debug)]
        pub struct $ty;

        impl Function for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn caps(&self) -> FnCaps {
                FnCaps::PURE | FnCaps::REDUCTION
            }
            fn max_args(&self) -> Option<usize> {
                None
            }
            fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
                reduce_values(args, $name, $reduce)
            }
        }
    };
}

reduction_fn!(SumFn, "sum", |xs| xs.iter().sum());
reduction_fn!(MinFn, "min", |xs| xs.iter().copied().fold(f64::INFINITY, f64::min));
reduction_fn!(MaxFn, "max", |xs| xs
    .iter()
    .copied()
    .fold(f64::NEG_INFINITY, f64::max));
reduction_fn!(MeanFn, "mean", |xs| xs.iter().sum::<f64>() / xs.len() as f64);
reduction_fn!(MedianFn, "median", median);

/// Product does not keep units: `prod(2 m, 3 m)` would need unit powers.
#[derive(Debug)]
pub struct ProdFn;

impl Function for ProdFn {
    fn name(&self) -> &'static str {
        "prod"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        if args.iter().any(|a| matches!(a, Value::Quantity(_))) {
            return Err(CalcError::unit("prod does not accept units"));
        }
        reduce_values(args, "prod", |xs| xs.iter().product())
    }
}

fn median(xs: &[f64]) -> f64 {
    let mut sorted = xs.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn register_builtins(out: &mut Vec<Arc<dyn Function>>) {
    out.push(Arc::new(SumFn));
    out.push(Arc::new(ProdFn));
    out.push(Arc::new(MinFn));
    out.push(Arc::new(MaxFn));
    out.push(Arc::new(MeanFn));
    out.push(Arc::new(MedianFn));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitRegistry;
    use linecalc_common::Quantity;

    #[test]
    fn reductions_flatten_matrices() {
        let m = Value::Matrix(vec![vec![1.0.into(), 2.0.into()], vec![3.0.into(), 4.0.into()]]);
        assert_eq!(SumFn.dispatch(&[m.clone()]).unwrap(), Value::Numeric(10.0));
        assert_eq!(MedianFn.dispatch(&[m.clone()]).unwrap(), Value::Numeric(2.5));
        assert_eq!(MaxFn.dispatch(&[m, 7.0.into()]).unwrap(), Value::Numeric(7.0));
    }

    #[test]
    fn quantities_use_first_unit() {
        let reg = UnitRegistry::new();
        let km = Value::Quantity(Quantity::new(1.0, reg.lookup("km").unwrap()));
        let m = Value::Quantity(Quantity::new(500.0, reg.lookup("m").unwrap()));
        match SumFn.dispatch(&[km, m]).unwrap() {
            Value::Quantity(q) => {
                assert!((q.value - 1.5).abs() < 1e-12);
                assert_eq!(q.unit.to_string(), "km");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_reduction_is_arity_error() {
        assert!(MeanFn.dispatch(&[]).is_err());
    }
}
