use crate::{
    builtins::{self, factorial, math::modulo},
    function_registry,
    scope::Scope,
    traits::{CompiledExpr, Evaluator},
    units::UnitRegistry,
};
use linecalc_common::{CalcError, FunctionDef, Quantity, Unit, Value};
use linecalc_parse::{AstNode, AstNodeType};

/// Nested user-function calls beyond this depth fail instead of overflowing the stack.
const MAX_CALL_DEPTH: usize = 64;

/// Tree-walking evaluator over [`AstNode`]s.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    units: UnitRegistry,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    /// Register or update a currency rate (units of `code` per US dollar).
    pub fn register_currency(&mut self, code: &str, per_usd: f64) -> bool {
        self.units.register_currency(code, per_usd)
    }

    pub fn evaluate_ast(&self, node: &AstNode, scope: &mut Scope) -> Result<Value, CalcError> {
        self.eval_node(node, scope, 0)
    }

    fn eval_node(
        &self,
        node: &AstNode,
        scope: &mut Scope,
        depth: usize,
    ) -> Result<Value, CalcError> {
        match &node.node_type {
            AstNodeType::Number(n) => Ok(Value::Numeric(*n)),
            AstNodeType::Text(s) => Ok(Value::Textual(s.clone())),
            AstNodeType::Symbol(name) => self.eval_symbol(name, scope),
            AstNodeType::UnaryOp { op, expr } => {
                let v = self.eval_node(expr, scope, depth)?;
                self.eval_unary(op, v)
            }
            AstNodeType::BinaryOp { op, left, right } => {
                let l = self.eval_node(left, scope, depth)?;
                let r = self.eval_node(right, scope, depth)?;
                self.eval_binary(op, l, r)
            }
            AstNodeType::Function { name, args } => self.eval_function(name, args, scope, depth),
            AstNodeType::Matrix(rows) => self.eval_matrix_literal(rows, scope, depth),
            AstNodeType::Assign { name, value } => {
                let v = self.eval_node(value, scope, depth)?;
                scope.set(name.clone(), v.clone());
                Ok(v)
            }
            AstNodeType::FunctionDef {
                name,
                params,
                source,
                ..
            } => {
                let v = Value::FunctionExpr(FunctionDef {
                    name: name.clone(),
                    params: params.clone(),
                    body: source.clone(),
                });
                scope.set(name.clone(), v.clone());
                Ok(v)
            }
        }
    }

    /// Scope first, then constants, then units.
    fn eval_symbol(&self, name: &str, scope: &Scope) -> Result<Value, CalcError> {
        if let Some(v) = scope.get(name) {
            return Ok(v.clone());
        }
        if let Some(v) = builtins::constant(name) {
            return Ok(v);
        }
        if let Some(unit) = self.units.lookup(name) {
            return Ok(Value::Quantity(Quantity::new(1.0, unit)));
        }
        Err(CalcError::undefined(name))
    }

    fn eval_unary(&self, op: &str, v: Value) -> Result<Value, CalcError> {
        if let Value::Matrix(rows) = v {
            return map_matrix(rows, |cell| self.eval_unary(op, cell));
        }
        match op {
            "+" => match v {
                Value::Quantity(_) => Ok(v),
                other => Ok(Value::Numeric(scalar_num(&other, op)?)),
            },
            "-" => match v {
                Value::Quantity(q) => Ok(Value::Quantity(Quantity::new(-q.value, q.unit))),
                other => Ok(Value::Numeric(-scalar_num(&other, op)?)),
            },
            "%" => match v {
                Value::Quantity(q) => Ok(Value::Quantity(Quantity::new(q.value / 100.0, q.unit))),
                other => Ok(Value::Numeric(scalar_num(&other, op)? / 100.0)),
            },
            "!" => Ok(Value::Numeric(factorial(scalar_num(&v, op)?)?)),
            _ => Err(CalcError::syntax(format!("Unknown unary operator '{op}'"))),
        }
    }

    fn eval_binary(&self, op: &str, left: Value, right: Value) -> Result<Value, CalcError> {
        match op {
            "+" | "-" | "*" | "/" | "^" | "%" => self.arith(op, left, right),
            "==" | "!=" | "<" | ">" | "<=" | ">=" => compare(op, &left, &right),
            "to" => self.convert(left, right),
            _ => Err(CalcError::syntax(format!("Unknown operator '{op}'"))),
        }
    }

    fn eval_function(
        &self,
        name: &str,
        args: &[AstNode],
        scope: &mut Scope,
        depth: usize,
    ) -> Result<Value, CalcError> {
        match scope.get(name) {
            Some(Value::FunctionExpr(def)) => {
                let def = def.clone();
                return self.call_user(&def, args, scope, depth);
            }
            Some(other) => {
                return Err(CalcError::type_error(format!(
                    "{name} is a {}, not a function",
                    other.type_name()
                )));
            }
            None => {}
        }

        let Some(f) = function_registry::get(name) else {
            return Err(CalcError::undefined(name));
        };
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_node(arg, scope, depth)?);
        }
        f.dispatch(&values)
    }

    /// Evaluate a user function body in a copy of the caller's scope with the
    /// parameters bound. Assignments inside the body do not leak out.
    fn call_user(
        &self,
        def: &FunctionDef,
        args: &[AstNode],
        scope: &mut Scope,
        depth: usize,
    ) -> Result<Value, CalcError> {
        if depth >= MAX_CALL_DEPTH {
            return Err(CalcError::domain(format!(
                "{}: maximum call depth exceeded",
                def.name
            )));
        }
        if args.len() != def.params.len() {
            return Err(CalcError::arity(
                &def.name,
                &def.params.len().to_string(),
                args.len(),
            ));
        }

        let mut local = scope.clone();
        for (param, arg) in def.params.iter().zip(args) {
            let v = self.eval_node(arg, scope, depth)?;
            local.set(param.clone(), v);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(function = %def.name, depth, "calling user function");

        let body = linecalc_parse::parse(&def.body)?;
        self.eval_node(&body, &mut local, depth + 1)
    }

    fn eval_matrix_literal(
        &self,
        rows: &[Vec<AstNode>],
        scope: &mut Scope,
        depth: usize,
    ) -> Result<Value, CalcError> {
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            for cell in row {
                cells.push(self.eval_node(cell, scope, depth)?);
            }
            out.push(cells);
        }
        Ok(Value::Matrix(out))
    }

    /* ───────────────────────────── arithmetic ──────────────────────────── */

    fn arith(&self, op: &str, left: Value, right: Value) -> Result<Value, CalcError> {
        if matches!(left, Value::Matrix(_)) || matches!(right, Value::Matrix(_)) {
            if let (Value::Matrix(a), Value::Matrix(b)) = (&left, &right) {
                if op == "*" {
                    return self.matmul(a, b);
                }
            }
            if let Value::Matrix(a) = &left {
                if op == "^" {
                    return self.matrix_power(a, &right);
                }
            }
            return self.broadcast(op, left, right);
        }
        match op {
            "+" | "-" => add_sub(op, left, right),
            "*" => mul(left, right),
            "/" => div(left, right),
            "^" => pow(left, right),
            _ => rem(left, right),
        }
    }

    fn broadcast(&self, op: &str, left: Value, right: Value) -> Result<Value, CalcError> {
        match (left, right) {
            (Value::Matrix(a), Value::Matrix(b)) => {
                if a.len() != b.len() || a.iter().zip(&b).any(|(x, y)| x.len() != y.len()) {
                    return Err(CalcError::type_error(format!(
                        "Matrix dimensions do not match for '{op}'"
                    )));
                }
                let mut out = Vec::with_capacity(a.len());
                for (ra, rb) in a.into_iter().zip(b) {
                    let row = ra
                        .into_iter()
                        .zip(rb)
                        .map(|(x, y)| self.arith(op, x, y))
                        .collect::<Result<Vec<_>, _>>()?;
                    out.push(row);
                }
                Ok(Value::Matrix(out))
            }
            (Value::Matrix(a), s) => map_matrix(a, |x| self.arith(op, x, s.clone())),
            (s, Value::Matrix(b)) => map_matrix(b, |y| self.arith(op, s.clone(), y)),
            (l, r) => self.arith(op, l, r),
        }
    }

    fn matmul(&self, a: &[Vec<Value>], b: &[Vec<Value>]) -> Result<Value, CalcError> {
        let inner = a.first().map_or(0, Vec::len);
        let cols = b.first().map_or(0, Vec::len);
        if inner != b.len() {
            return Err(CalcError::type_error(format!(
                "Cannot multiply a {}x{inner} matrix by a {}x{cols} matrix",
                a.len(),
                b.len()
            )));
        }
        let mut out = Vec::with_capacity(a.len());
        for row in a {
            let mut out_row = Vec::with_capacity(cols);
            for j in 0..cols {
                let mut acc = Value::Numeric(0.0);
                for (k, x) in row.iter().enumerate() {
                    let term = self.arith("*", x.clone(), b[k][j].clone())?;
                    acc = if k == 0 { term } else { self.arith("+", acc, term)? };
                }
                out_row.push(acc);
            }
            out.push(out_row);
        }
        Ok(Value::Matrix(out))
    }

    fn matrix_power(&self, m: &[Vec<Value>], exponent: &Value) -> Result<Value, CalcError> {
        let n = scalar_num(exponent, "^")?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(CalcError::domain("Matrix power requires a non-negative integer exponent"));
        }
        if m.iter().any(|row| row.len() != m.len()) {
            return Err(CalcError::type_error("Matrix power requires a square matrix"));
        }
        let size = m.len();
        let mut result: Vec<Vec<Value>> = (0..size)
            .map(|i| {
                (0..size)
                    .map(|j| Value::Numeric(if i == j { 1.0 } else { 0.0 }))
                    .collect()
            })
            .collect();
        for _ in 0..n as u32 {
            match self.matmul(&result, m)? {
                Value::Matrix(next) => result = next,
                other => return Ok(other),
            }
        }
        Ok(Value::Matrix(result))
    }

    /// `expr to unit`: the right operand supplies the target unit.
    fn convert(&self, left: Value, right: Value) -> Result<Value, CalcError> {
        let Value::Quantity(target) = right else {
            return Err(CalcError::unit(format!(
                "Cannot convert to a {}",
                right.type_name()
            )));
        };
        match left {
            Value::Quantity(q) => q
                .convert_to(&target.unit)
                .map(Value::Quantity)
                .ok_or_else(|| mismatch(&q.unit, &target.unit)),
            Value::Matrix(rows) => {
                map_matrix(rows, |cell| self.convert(cell, Value::Quantity(target.clone())))
            }
            other => Err(CalcError::unit(format!(
                "Cannot convert a {} to {}",
                other.type_name(),
                target.unit
            ))),
        }
    }
}

impl Evaluator for Interpreter {
    fn compile(&self, expr: &str) -> Result<CompiledExpr, CalcError> {
        let ast = linecalc_parse::parse(expr)?;
        Ok(CompiledExpr::new(expr, ast))
    }

    fn evaluate_compiled(
        &self,
        compiled: &CompiledExpr,
        scope: &mut Scope,
    ) -> Result<Value, CalcError> {
        #[cfg(feature = "tracing")]
        let _span = tracing::trace_span!("evaluate", expr = compiled.source()).entered();
        self.evaluate_ast(compiled.ast(), scope)
    }
}

/* ───────────────────────────── scalar helpers ─────────────────────────── */

fn scalar_num(v: &Value, op: &str) -> Result<f64, CalcError> {
    match v {
        Value::Numeric(n) => Ok(*n),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(CalcError::type_error(format!(
            "Cannot apply '{op}' to a {}",
            other.type_name()
        ))),
    }
}

fn mismatch(a: &Unit, b: &Unit) -> CalcError {
    CalcError::unit(format!("Units do not match: {a} and {b}"))
}

fn map_matrix<F>(rows: Vec<Vec<Value>>, mut f: F) -> Result<Value, CalcError>
where
    F: FnMut(Value) -> Result<Value, CalcError>,
{
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut mapped = Vec::with_capacity(row.len());
        for cell in row {
            mapped.push(f(cell)?);
        }
        out.push(mapped);
    }
    Ok(Value::Matrix(out))
}

/// A quantity whose unit cancelled out becomes a plain number.
fn normalize(value: f64, unit: Unit) -> Value {
    if unit.is_empty() {
        Value::Numeric(value)
    } else if unit.is_dimensionless() {
        Value::Numeric(value * unit.scale())
    } else {
        Value::Quantity(Quantity::new(value, unit))
    }
}

/// Re-express terms of `b` in the symbols `a` already uses for the same
/// dimension, so `km/h * 30 min` cancels to `km`.
fn align_units(a: &Unit, mut b: Quantity) -> Quantity {
    for term in b.unit.terms.iter_mut() {
        let Some(existing) = a
            .terms
            .iter()
            .find(|t| t.dims == term.dims && t.symbol != term.symbol)
        else {
            continue;
        };
        if existing.offset != 0.0 || term.offset != 0.0 {
            continue;
        }
        b.value *= (term.scale / existing.scale).powi(term.power as i32);
        term.symbol = existing.symbol.clone();
        term.scale = existing.scale;
    }
    // Merge terms that now share a symbol.
    let mut merged = Unit::default();
    for term in b.unit.terms.drain(..) {
        merged = merged.multiply(&Unit::from_term(term));
    }
    b.unit = merged;
    b
}

fn add_sub(op: &str, left: Value, right: Value) -> Result<Value, CalcError> {
    let sign = if op == "+" { 1.0 } else { -1.0 };
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = b.convert_to(&a.unit).ok_or_else(|| mismatch(&a.unit, &b.unit))?;
            Ok(Value::Quantity(Quantity::new(a.value + sign * b.value, a.unit)))
        }
        (Value::Quantity(q), other) | (other, Value::Quantity(q)) => Err(CalcError::unit(format!(
            "Cannot apply '{op}' to {} and a {}",
            q.unit,
            other.type_name()
        ))),
        (l, r) => Ok(Value::Numeric(scalar_num(&l, op)? + sign * scalar_num(&r, op)?)),
    }
}

fn mul(left: Value, right: Value) -> Result<Value, CalcError> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = align_units(&a.unit, b);
            Ok(normalize(a.value * b.value, a.unit.multiply(&b.unit)))
        }
        (Value::Quantity(q), other) | (other, Value::Quantity(q)) => {
            let n = scalar_num(&other, "*")?;
            Ok(Value::Quantity(Quantity::new(q.value * n, q.unit)))
        }
        (l, r) => Ok(Value::Numeric(scalar_num(&l, "*")? * scalar_num(&r, "*")?)),
    }
}

fn div(left: Value, right: Value) -> Result<Value, CalcError> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = align_units(&a.unit, b);
            Ok(normalize(a.value / b.value, a.unit.divide(&b.unit)))
        }
        (Value::Quantity(q), other) => {
            let n = scalar_num(&other, "/")?;
            Ok(Value::Quantity(Quantity::new(q.value / n, q.unit)))
        }
        (other, Value::Quantity(q)) => {
            let n = scalar_num(&other, "/")?;
            Ok(normalize(n / q.value, Unit::default().divide(&q.unit)))
        }
        (l, r) => Ok(Value::Numeric(scalar_num(&l, "/")? / scalar_num(&r, "/")?)),
    }
}

fn pow(left: Value, right: Value) -> Result<Value, CalcError> {
    let exponent = scalar_num(&right, "^")?;
    match left {
        Value::Quantity(q) => {
            if exponent.fract() != 0.0 || exponent.abs() > i8::MAX as f64 {
                return Err(CalcError::unit(
                    "Units can only be raised to small integer powers",
                ));
            }
            Ok(normalize(q.value.powf(exponent), q.unit.powi(exponent as i8)))
        }
        other => Ok(Value::Numeric(scalar_num(&other, "^")?.powf(exponent))),
    }
}

fn rem(left: Value, right: Value) -> Result<Value, CalcError> {
    match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            let b = b.convert_to(&a.unit).ok_or_else(|| mismatch(&a.unit, &b.unit))?;
            Ok(Value::Quantity(Quantity::new(modulo(a.value, b.value), a.unit)))
        }
        (Value::Quantity(q), other) => {
            let n = scalar_num(&other, "%")?;
            Ok(Value::Quantity(Quantity::new(modulo(q.value, n), q.unit)))
        }
        (l, r) => Ok(Value::Numeric(modulo(scalar_num(&l, "%")?, scalar_num(&r, "%")?))),
    }
}

fn compare(op: &str, left: &Value, right: &Value) -> Result<Value, CalcError> {
    use std::cmp::Ordering;

    let ordering: Option<Ordering> = match (left, right) {
        (Value::Quantity(a), Value::Quantity(b)) => {
            if !a.unit.same_dimension(&b.unit) {
                return Err(mismatch(&a.unit, &b.unit));
            }
            a.base_value().partial_cmp(&b.base_value())
        }
        (Value::Textual(a), Value::Textual(b)) => Some(a.cmp(b)),
        (Value::Quantity(_), _) | (_, Value::Quantity(_)) => {
            return Err(CalcError::unit("Cannot compare a unit with a number"));
        }
        (l, r) => scalar_num(l, op)?.partial_cmp(&scalar_num(r, op)?),
    };

    // NaN compares unequal to everything
    let result = match (op, ordering) {
        ("!=", None) => true,
        (_, None) => false,
        ("==", Some(o)) => o == Ordering::Equal,
        ("!=", Some(o)) => o != Ordering::Equal,
        ("<", Some(o)) => o == Ordering::Less,
        (">", Some(o)) => o == Ordering::Greater,
        ("<=", Some(o)) => o != Ordering::Greater,
        (_, Some(o)) => o != Ordering::Less,
    };
    Ok(Value::Boolean(result))
}
