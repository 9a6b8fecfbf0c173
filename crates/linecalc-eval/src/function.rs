//! The `Function` trait implemented by every built-in, plus its capability flags.

use linecalc_common::{CalcError, Value};

bitflags::bitflags! {
    /// Describes how the dispatcher should feed arguments to a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FnCaps: u8 {
        /// Same output for the same input, no side effects.
        const PURE        = 0b0000_0001;
        /// Output can change between calls (`random`).
        const VOLATILE    = 0b0000_0010;
        /// Matrix arguments are flattened into one argument list (`sum`, `max`).
        const REDUCTION   = 0b0000_0100;
        /// A single matrix argument is mapped cell by cell (`sqrt`, `round`).
        const ELEMENTWISE = 0b0000_1000;
    }
}

pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    fn min_args(&self) -> usize {
        1
    }

    /// `None` means variadic.
    fn max_args(&self) -> Option<usize> {
        Some(self.min_args())
    }

    fn eval(&self, args: &[Value]) -> Result<Value, CalcError>;

    /// Arity check, then matrix flattening or mapping per [`FnCaps`], then `eval`.
    fn dispatch(&self, args: &[Value]) -> Result<Value, CalcError> {
        let caps = self.caps();

        if caps.contains(FnCaps::REDUCTION) && args.iter().any(|a| matches!(a, Value::Matrix(_))) {
            let mut flat = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Value::Matrix(rows) => flat.extend(rows.iter().flatten().cloned()),
                    other => flat.push(other.clone()),
                }
            }
            check_arity(self, flat.len())?;
            return self.eval(&flat);
        }

        check_arity(self, args.len())?;

        if caps.contains(FnCaps::ELEMENTWISE) {
            if let Some(Value::Matrix(rows)) = args.first() {
                let rest = &args[1..];
                let mut out = Vec::with_capacity(rows.len());
                for row in rows {
                    let mut mapped = Vec::with_capacity(row.len());
                    for cell in row {
                        let mut call = Vec::with_capacity(args.len());
                        call.push(cell.clone());
                        call.extend_from_slice(rest);
                        mapped.push(self.eval(&call)?);
                    }
                    out.push(mapped);
                }
                return Ok(Value::Matrix(out));
            }
        }

        self.eval(args)
    }
}

fn check_arity<F: Function + ?Sized>(f: &F, got: usize) -> Result<(), CalcError> {
    let min = f.min_args();
    match f.max_args() {
        Some(max) if got < min || got > max => {
            let expected = if min == max {
                min.to_string()
            } else {
                format!("{min}-{max}")
            };
            Err(CalcError::arity(f.name(), &expected, got))
        }
        None if got < min => Err(CalcError::arity(f.name(), &format!("at least {min}"), got)),
        _ => Ok(()),
    }
}
