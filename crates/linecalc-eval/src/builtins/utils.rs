use linecalc_common::{BaseDimension, CalcError, Quantity, Value};

/// Coerce a scalar to `f64`.
/// - Numeric maps to itself
/// - Boolean maps to 1.0/0.0
/// - Dimensionless quantities map to their base value
/// - Others -> type error
pub fn coerce_num(value: &Value, fname: &str) -> Result<f64, CalcError> {
    match value {
        Value::Numeric(n) => Ok(*n),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Quantity(q) if q.unit.is_dimensionless() => Ok(q.base_value()),
        other => Err(CalcError::type_error(format!(
            "{fname} expects a number, got {}",
            other.type_name()
        ))),
    }
}

/// Largest magnitude an `f64` holds as an exact integer (2^53).
pub const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Integer-valued argument (for `gcd`, `factorial`, digit counts).
pub fn coerce_int(value: &Value, fname: &str) -> Result<i64, CalcError> {
    let n = coerce_num(value, fname)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(CalcError::domain(format!("{fname} expects an integer, got {n}")));
    }
    if n.abs() > MAX_EXACT_INT {
        return Err(CalcError::domain(format!(
            "{fname} expects an integer of at most 2^53 in magnitude, got {n}"
        )));
    }
    Ok(n as i64)
}

/// Angles: plain numbers are radians, angle quantities are converted.
pub fn coerce_angle(value: &Value, fname: &str) -> Result<f64, CalcError> {
    match value {
        Value::Quantity(q) if q.unit.dims() == BaseDimension::Angle.dims() => Ok(q.base_value()),
        Value::Quantity(q) => Err(CalcError::unit(format!(
            "{fname} expects an angle, got {}",
            q.unit
        ))),
        other => coerce_num(other, fname),
    }
}

pub fn unary_numeric<F>(args: &[Value], fname: &str, f: F) -> Result<Value, CalcError>
where
    F: Fn(f64) -> Result<f64, CalcError>,
{
    let x = coerce_num(&args[0], fname)?;
    Ok(Value::Numeric(f(x)?))
}

/// Apply `f` to the magnitude, keeping any unit (`abs(-5 km)` → `5 km`).
pub fn map_magnitude<F>(value: &Value, fname: &str, f: F) -> Result<Value, CalcError>
where
    F: Fn(f64) -> f64,
{
    match value {
        Value::Quantity(q) => Ok(Value::Quantity(Quantity::new(f(q.value), q.unit.clone()))),
        other => Ok(Value::Numeric(f(coerce_num(other, fname)?))),
    }
}

/// Reduce a flat argument list. Quantities must share one dimension and are
/// expressed in the first argument's unit.
pub fn reduce_values<F>(args: &[Value], fname: &str, f: F) -> Result<Value, CalcError>
where
    F: Fn(&[f64]) -> f64,
{
    let Some(Value::Quantity(first)) = args.iter().find(|v| matches!(v, Value::Quantity(_)))
    else {
        let nums = args
            .iter()
            .map(|v| coerce_num(v, fname))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Numeric(f(&nums)));
    };

    let unit = first.unit.clone();
    let mut nums = Vec::with_capacity(args.len());
    for arg in args {
        let Value::Quantity(q) = arg else {
            return Err(CalcError::unit(format!(
                "{fname} cannot mix numbers and units"
            )));
        };
        let converted = q
            .convert_to(&unit)
            .ok_or_else(|| {
                CalcError::unit(format!("{fname}: units {} and {unit} do not match", q.unit))
            })?;
        nums.push(converted.value);
    }
    Ok(Value::Quantity(Quantity::new(f(&nums), unit)))
}

/// `n!` for non-negative integers; overflows to infinity past 170.
pub fn factorial(n: f64) -> Result<f64, CalcError> {
    if n < 0.0 || n.fract() != 0.0 || n.is_nan() {
        return Err(CalcError::domain(format!(
            "factorial is only defined for non-negative integers, got {n}"
        )));
    }
    if n > 170.0 {
        return Ok(f64::INFINITY);
    }
    Ok((2..=n as u32).fold(1.0, |acc, k| acc * k as f64))
}

pub fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Round half away from zero to `digits` fraction digits.
pub fn round_to_precision(n: f64, digits: i32) -> f64 {
    if digits <= 0 {
        return n.round();
    }
    let factor = 10f64.powi(digits);
    (n * factor).round() / factor
}
