use super::utils::{
    coerce_int, coerce_num, factorial, gcd, map_magnitude, reduce_values, round_to_precision,
    unary_numeric,
};
use crate::function::{FnCaps, Function};
use linecalc_common::{CalcError, Value};
use std::sync::Arc;

/// Declares a one-argument elementwise numeric function.
macro_rules! unary_fn {
    ($ty:ident, $name:literal, |$x:ident| $body:expr) => {
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
                unary_numeric(args, $name, |$x| $body)
            }
        }
    };
}

/* ─────────────────────────── powers & logs ────────────────────────── */

unary_fn!(SqrtFn, "sqrt", |x| {
    if x < 0.0 {
        Err(CalcError::domain("sqrt of a negative number"))
    } else {
        Ok(x.sqrt())
    }
});
unary_fn!(CbrtFn, "cbrt", |x| Ok(x.cbrt()));
unary_fn!(ExpFn, "exp", |x| Ok(x.exp()));
unary_fn!(LnFn, "ln", |x| positive(x, "ln").map(f64::ln));
unary_fn!(Log10Fn, "log10", |x| positive(x, "log10").map(f64::log10));
unary_fn!(Log2Fn, "log2", |x| positive(x, "log2").map(f64::log2));
unary_fn!(SignFn, "sign", |x| Ok(if x == 0.0 { 0.0 } else { x.signum() }));

fn positive(x: f64, fname: &str) -> Result<f64, CalcError> {
    if x <= 0.0 {
        Err(CalcError::domain(format!("{fname} is only defined for positive numbers")))
    } else {
        Ok(x)
    }
}

/// `log(x)` is natural, `log(x, base)` uses the given base.
#[derive(Debug)]
pub struct LogFn;

impl Function for LogFn {
    fn name(&self) -> &'static str {
        "log"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let x = positive(coerce_num(&args[0], "log")?, "log")?;
        match args.get(1) {
            None => Ok(Value::Numeric(x.ln())),
            Some(base) => {
                let base = positive(coerce_num(base, "log")?, "log")?;
                Ok(Value::Numeric(x.ln() / base.ln()))
            }
        }
    }
}

#[derive(Debug)]
pub struct PowFn;

impl Function for PowFn {
    fn name(&self) -> &'static str {
        "pow"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let base = coerce_num(&args[0], "pow")?;
        let exp = coerce_num(&args[1], "pow")?;
        Ok(Value::Numeric(base.powf(exp)))
    }
}

#[derive(Debug)]
pub struct NthRootFn;

impl Function for NthRootFn {
    fn name(&self) -> &'static str {
        "nthroot"
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let x = coerce_num(&args[0], "nthroot")?;
        let n = match args.get(1) {
            Some(v) => coerce_num(v, "nthroot")?,
            None => 2.0,
        };
        if n == 0.0 {
            return Err(CalcError::domain("nthroot: root must be non-zero"));
        }
        if x < 0.0 {
            // Odd integer roots of negatives are real.
            if n.fract() == 0.0 && (n as i64) % 2 != 0 {
                return Ok(Value::Numeric(-(-x).powf(1.0 / n)));
            }
            return Err(CalcError::domain("nthroot: even root of a negative number"));
        }
        Ok(Value::Numeric(x.powf(1.0 / n)))
    }
}

#[derive(Debug)]
pub struct HypotFn;

impl Function for HypotFn {
    fn name(&self) -> &'static str {
        "hypot"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        reduce_values(args, "hypot", |xs| xs.iter().map(|x| x * x).sum::<f64>().sqrt())
    }
}

/* ───────────────────────────── rounding ───────────────────────────── */

#[derive(Debug)]
pub struct AbsFn;

impl Function for AbsFn {
    fn name(&self) -> &'static str {
        "abs"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        map_magnitude(&args[0], "abs", f64::abs)
    }
}

#[derive(Debug)]
pub struct FloorFn;

impl Function for FloorFn {
    fn name(&self) -> &'static str {
        "floor"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        map_magnitude(&args[0], "floor", f64::floor)
    }
}

#[derive(Debug)]
pub struct CeilFn;

impl Function for CeilFn {
    fn name(&self) -> &'static str {
        "ceil"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        map_magnitude(&args[0], "ceil", f64::ceil)
    }
}

/// Round toward zero.
#[derive(Debug)]
pub struct FixFn;

impl Function for FixFn {
    fn name(&self) -> &'static str {
        "fix"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        map_magnitude(&args[0], "fix", f64::trunc)
    }
}

/// `round(x)` or `round(x, digits)`.
#[derive(Debug)]
pub struct RoundFn;

impl Function for RoundFn {
    fn name(&self) -> &'static str {
        "round"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let digits = match args.get(1) {
            Some(d) => coerce_int(d, "round")?,
            None => 0,
        };
        if !(0..=15).contains(&digits) {
            return Err(CalcError::domain("round: digits must be between 0 and 15"));
        }
        map_magnitude(&args[0], "round", |x| round_to_precision(x, digits as i32))
    }
}

/* ────────────────────────── integer helpers ───────────────────────── */

#[derive(Debug)]
pub struct ModFn;

impl Function for ModFn {
    fn name(&self) -> &'static str {
        "mod"
    }
    fn min_args(&self) -> usize {
        2
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let a = coerce_num(&args[0], "mod")?;
        let b = coerce_num(&args[1], "mod")?;
        Ok(Value::Numeric(modulo(a, b)))
    }
}

/// Floored modulo: the result takes the sign of the divisor; `x mod 0` is `x`.
pub fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return a;
    }
    a - b * (a / b).floor()
}

#[derive(Debug)]
pub struct FactorialFn;

impl Function for FactorialFn {
    fn name(&self) -> &'static str {
        "factorial"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        unary_numeric(args, "factorial", factorial)
    }
}

#[derive(Debug)]
pub struct GcdFn;

impl Function for GcdFn {
    fn name(&self) -> &'static str {
        "gcd"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let mut acc = 0;
        for arg in args {
            acc = gcd(acc, coerce_int(arg, "gcd")?);
        }
        Ok(Value::Numeric(acc as f64))
    }
}

#[derive(Debug)]
pub struct LcmFn;

impl Function for LcmFn {
    fn name(&self) -> &'static str {
        "lcm"
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::REDUCTION
    }
    fn max_args(&self) -> Option<usize> {
        None
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        let mut acc: i64 = 1;
        for arg in args {
            let n = coerce_int(arg, "lcm")?;
            if n == 0 {
                return Ok(Value::Numeric(0.0));
            }
            acc = (acc / gcd(acc, n)).saturating_mul(n.abs());
        }
        Ok(Value::Numeric(acc as f64))
    }
}

pub fn register_builtins(out: &mut Vec<Arc<dyn Function>>) {
    out.push(Arc::new(SqrtFn));
    out.push(Arc::new(CbrtFn));
    out.push(Arc::new(ExpFn));
    out.push(Arc::new(LnFn));
    out.push(Arc::new(LogFn));
    out.push(Arc::new(Log10Fn));
    out.push(Arc::new(Log2Fn));
    out.push(Arc::new(SignFn));
    out.push(Arc::new(PowFn));
    out.push(Arc::new(NthRootFn));
    out.push(Arc::new(HypotFn));
    out.push(Arc::new(AbsFn));
    out.push(Arc::new(FloorFn));
    out.push(Arc::new(CeilFn));
    out.push(Arc::new(FixFn));
    out.push(Arc::new(RoundFn));
    out.push(Arc::new(ModFn));
    out.push(Arc::new(FactorialFn));
    out.push(Arc::new(GcdFn));
    out.push(Arc::new(LcmFn));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: Value) -> f64 {
        v.as_number().unwrap()
    }

    #[test]
    fn log_with_base() {
        assert_eq!(num(LogFn.dispatch(&[8.0.into(), 2.0.into()]).unwrap()), 3.0);
        assert!(LogFn.dispatch(&[0.0.into()]).is_err());
    }

    #[test]
    fn round_digits_and_arity() {
        assert_eq!(num(RoundFn.dispatch(&[3.14159.into(), 2.0.into()]).unwrap()), 3.14);
        assert_eq!(num(RoundFn.dispatch(&[2.5.into()]).unwrap()), 3.0);
        let err = RoundFn.dispatch(&[]).unwrap_err();
        assert_eq!(err.kind, linecalc_common::CalcErrorKind::Arity);
    }

    #[test]
    fn elementwise_over_matrix() {
        let m = Value::Matrix(vec![vec![4.0.into(), 9.0.into()]]);
        assert_eq!(
            SqrtFn.dispatch(&[m]).unwrap(),
            Value::Matrix(vec![vec![2.0.into(), 3.0.into()]])
        );
    }

    #[test]
    fn integer_helpers() {
        assert_eq!(num(GcdFn.dispatch(&[12.0.into(), 18.0.into()]).unwrap()), 6.0);
        assert_eq!(num(LcmFn.dispatch(&[4.0.into(), 6.0.into()]).unwrap()), 12.0);
        assert_eq!(modulo(-1.0, 3.0), 2.0);
        let root = num(NthRootFn.dispatch(&[(-27.0).into(), 3.0.into()]).unwrap());
        assert!((root + 3.0).abs() < 1e-12);
    }
}
