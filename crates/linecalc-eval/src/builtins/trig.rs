use super::utils::{coerce_angle, coerce_num};
use crate::function::{FnCaps, Function};
use linecalc_common::{CalcError, Value};
use std::sync::Arc;

/* ─────────────────────────── TRIG: circular ────────────────────────── */

/// Declares a one-argument trig function taking radians or an angle quantity.
macro_rules! angle_fn {
    ($ty:ident, $name:literal, $f:expr) => {
        #[derive(Debug)]
        pub struct $ty;

        impl Function for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn caps(&self) -> FnCaps {
                FnCaps::PURE | FnCaps::ELEMENTWISE
            }
            fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
                let x = coerce_angle(&args[0], $name)?;
                Ok(Value::Numeric($f(x)))
            }
        }
    };
}

angle_fn!(SinFn, "sin", f64::sin);
angle_fn!(CosFn, "cos", f64::cos);
angle_fn!(TanFn, "tan", f64::tan);
angle_fn!(SinhFn, "sinh", f64::sinh);
angle_fn!(CoshFn, "cosh", f64::cosh);
angle_fn!(TanhFn, "tanh", f64::tanh);

/* ─────────────────────────── TRIG: inverse ─────────────────────────── */

macro_rules! inverse_fn {
    ($ty:ident, $name:literal, $f:expr, $domain:expr) => {
        #[derive(Debug)]
        pub struct $ty;

        impl Function for $ty {
            fn name(&self) -> &'static str {
                $name
            }
            fn caps(&self) -> FnCaps {
                FnCaps::PURE | FnCaps::ELEMENTWISE
            }
            fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
                let x = coerce_num(&args[0], $name)?;
                let in_domain: fn(f64) -> bool = $domain;
                if !in_domain(x) {
                    return Err(CalcError::domain(format!("{} is undefined for {x}", $name)));
                }
                Ok(Value::Numeric($f(x)))
            }
        }
    };
}

inverse_fn!(AsinFn, "asin", f64::asin, |x| (-1.0..=1.0).contains(&x));
inverse_fn!(AcosFn, "acos", f64::acos, |x| (-1.0..=1.0).contains(&x));
inverse_fn!(AtanFn, "atan", f64::atan, |_| true);

#[derive(Debug)]
pub struct Atan2Fn;

impl Function for Atan2Fn {
    fn name(&self) -> &'static str {
        "atan2"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let y = coerce_num(&args[0], "atan2")?;
        let x = coerce_num(&args[1], "atan2")?;
        Ok(Value::Numeric(y.atan2(x)))
    }
}

pub fn register_builtins(out: &mut Vec<Arc<dyn Function>>) {
    out.push(Arc::new(SinFn));
    out.push(Arc::new(CosFn));
    out.push(Arc::new(TanFn));
    out.push(Arc::new(SinhFn));
    out.push(Arc::new(CoshFn));
    out.push(Arc::new(TanhFn));
    out.push(Arc::new(AsinFn));
    out.push(Arc::new(AcosFn));
    out.push(Arc::new(AtanFn));
    out.push(Arc::new(Atan2Fn));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::UnitRegistry;
    use linecalc_common::Quantity;
    use std::f64::consts::PI;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} !~= {b}");
    }

    #[test]
    fn sin_accepts_degrees() {
        let deg = UnitRegistry::new().lookup("deg").unwrap();
        let v = SinFn
            .dispatch(&[Value::Quantity(Quantity::new(90.0, deg))])
            .unwrap();
        assert_close(v.as_number().unwrap(), 1.0);
        assert_close(SinFn.dispatch(&[(PI / 2.0).into()]).unwrap().as_number().unwrap(), 1.0);
    }

    #[test]
    fn sin_rejects_lengths() {
        let km = UnitRegistry::new().lookup("km").unwrap();
        let err = SinFn
            .dispatch(&[Value::Quantity(Quantity::new(1.0, km))])
            .unwrap_err();
        assert_eq!(err.kind, linecalc_common::CalcErrorKind::Unit);
    }

    #[test]
    fn inverse_domain() {
        assert!(AsinFn.dispatch(&[2.0.into()]).is_err());
        assert_close(AtanFn.dispatch(&[1.0.into()]).unwrap().as_number().unwrap(), PI / 4.0);
    }
}
