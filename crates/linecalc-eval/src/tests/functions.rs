use crate::function::{FnCaps, Function};
use crate::function_registry;
use crate::interpreter::Interpreter;
use crate::scope::Scope;
use crate::traits::Evaluator;
use linecalc_common::{CalcError, CalcErrorKind, Value};
use std::sync::Arc;

#[derive(Debug)]
struct DoubleFn;

impl Function for DoubleFn {
    fn name(&self) -> &'static str {
        "double"
    }
    fn aliases(&self) -> &'static [&'static str] {
        &["twice"]
    }
    fn caps(&self) -> FnCaps {
        FnCaps::PURE | FnCaps::ELEMENTWISE
    }
    fn eval(&self, args: &[Value]) -> Result<Value, CalcError> {
        match &args[0] {
            Value::Numeric(n) => Ok(Value::Numeric(n * 2.0)),
            other => Err(CalcError::type_error(format!(
                "double expects a number, got {}",
                other.type_name()
            ))),
        }
    }
}

#[test]
fn builtins_are_registered() {
    for name in ["sqrt", "log", "sin", "atan2", "mean", "median", "random", "gcd"] {
        assert!(function_registry::contains(name), "{name} missing");
    }
    assert!(!function_registry::contains("nosuch"));
    assert!(
        function_registry::get("random")
            .unwrap()
            .caps()
            .contains(FnCaps::VOLATILE)
    );
}

#[test]
fn registered_functions_are_callable_by_alias() {
    function_registry::register(Arc::new(DoubleFn));
    let interp = Interpreter::new();
    let mut scope = Scope::new();
    assert_eq!(
        interp.evaluate("twice(21)", &mut scope).unwrap(),
        Value::Numeric(42.0)
    );
    assert_eq!(
        interp.evaluate("double([1, 2])", &mut scope).unwrap(),
        Value::Matrix(vec![vec![2.0.into(), 4.0.into()]])
    );
}

#[test]
fn user_functions_shadow_builtins() {
    let interp = Interpreter::new();
    let mut scope = Scope::new();
    interp.evaluate("sqrt(x) = x + 1", &mut scope).unwrap();
    assert_eq!(
        interp.evaluate("sqrt(4)", &mut scope).unwrap(),
        Value::Numeric(5.0)
    );
}

#[test]
fn arity_is_checked_before_eval() {
    let interp = Interpreter::new();
    let err = interp.evaluate("atan2(1)", &mut Scope::new()).unwrap_err();
    assert_eq!(err.to_string(), "Wrong number of arguments: atan2 expects 2 argument(s), got 1");
}

#[test]
fn integer_functions_reject_inexact_magnitudes() {
    let interp = Interpreter::new();
    let mut scope = Scope::new();
    for expr in ["gcd(-1e19, 2)", "lcm(1e19, 3)", "gcd(2^60, 4)"] {
        let err = interp.evaluate(expr, &mut scope).unwrap_err();
        assert_eq!(err.kind, CalcErrorKind::Domain, "{expr}");
    }
    assert_eq!(
        interp.evaluate("gcd(-12, 18)", &mut scope).unwrap(),
        Value::Numeric(6.0)
    );
    assert_eq!(
        interp.evaluate("gcd(-2^53, 2)", &mut scope).unwrap(),
        Value::Numeric(2.0)
    );
}
