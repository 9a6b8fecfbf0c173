use smallvec::SmallVec;
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of independent base dimensions tracked per unit.
pub const DIM_COUNT: usize = 10;

/// Exponent vector over [`BaseDimension`], indexed by `BaseDimension as usize`.
pub type Dimensions = [i8; DIM_COUNT];

pub const DIMENSIONLESS: Dimensions = [0; DIM_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseDimension {
    Length,
    Mass,
    Time,
    Current,
    Temperature,
    Amount,
    Luminosity,
    Angle,
    Information,
    Currency,
}

impl BaseDimension {
    pub const fn dims(self) -> Dimensions {
        let mut d = DIMENSIONLESS;
        d[self as usize] = 1;
        d
    }
}

/// One named unit raised to a power, e.g. `km` or `s^-2`.
///
/// `scale` converts one of this unit into the SI base of its dimension and
/// `offset` is added before scaling (only non-zero for affine temperature units).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTerm {
    pub symbol: String,
    pub power: i8,
    pub scale: f64,
    pub offset: f64,
    pub dims: Dimensions,
}

impl UnitTerm {
    pub fn new(symbol: impl Into<String>, scale: f64, dims: Dimensions) -> Self {
        UnitTerm {
            symbol: symbol.into(),
            power: 1,
            scale,
            offset: 0.0,
            dims,
        }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// A product of unit terms. An empty term list is the dimensionless unit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Unit {
    pub terms: SmallVec<[UnitTerm; 2]>,
}

impl Unit {
    pub fn from_term(term: UnitTerm) -> Self {
        let mut terms = SmallVec::new();
        terms.push(term);
        Unit { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn dims(&self) -> Dimensions {
        let mut out = DIMENSIONLESS;
        for t in &self.terms {
            for (slot, d) in out.iter_mut().zip(t.dims.iter()) {
                *slot += d * t.power;
            }
        }
        out
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dims() == DIMENSIONLESS
    }

    pub fn same_dimension(&self, other: &Unit) -> bool {
        self.dims() == other.dims()
    }

    /// Multiplicative factor from this unit to the SI base.
    pub fn scale(&self) -> f64 {
        self.terms
            .iter()
            .map(|t| t.scale.powi(t.power as i32))
            .product()
    }

    /// Affine offsets only apply to a lone first-power term (`degC`, `degF`).
    /// Inside compound units they behave as deltas.
    pub fn offset(&self) -> f64 {
        match self.terms.as_slice() {
            [only] if only.power == 1 => only.offset,
            _ => 0.0,
        }
    }

    pub fn to_base(&self, value: f64) -> f64 {
        (value + self.offset()) * self.scale()
    }

    pub fn from_base(&self, base: f64) -> f64 {
        base / self.scale() - self.offset()
    }

    pub fn multiply(&self, other: &Unit) -> Unit {
        self.combine(other, 1)
    }

    pub fn divide(&self, other: &Unit) -> Unit {
        self.combine(other, -1)
    }

    pub fn powi(&self, exp: i8) -> Unit {
        let mut terms = self.terms.clone();
        for t in terms.iter_mut() {
            t.power *= exp;
        }
        terms.retain(|t| t.power != 0);
        Unit { terms }
    }

    fn combine(&self, other: &Unit, sign: i8) -> Unit {
        let mut terms = self.terms.clone();
        for t in &other.terms {
            let power = t.power * sign;
            match terms.iter_mut().find(|x| x.symbol == t.symbol) {
                Some(existing) => existing.power += power,
                None => {
                    let mut t = t.clone();
                    t.power = power;
                    terms.push(t);
                }
            }
        }
        terms.retain(|t| t.power != 0);
        Unit { terms }
    }
}

fn write_term(f: &mut fmt::Formatter<'_>, symbol: &str, power: i8) -> fmt::Result {
    if power == 1 {
        write!(f, "{symbol}")
    } else {
        write!(f, "{symbol}^{power}")
    }
}

impl Display for Unit {
    /// `km`, `m^2`, `km / h`, `kg m / s^2`, `s^-1`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num: Vec<&UnitTerm> = self.terms.iter().filter(|t| t.power > 0).collect();
        let den: Vec<&UnitTerm> = self.terms.iter().filter(|t| t.power < 0).collect();
        if num.is_empty() {
            for (i, t) in den.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                write_term(f, &t.symbol, t.power)?;
            }
            return Ok(());
        }
        for (i, t) in num.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write_term(f, &t.symbol, t.power)?;
        }
        if !den.is_empty() {
            f.write_str(" /")?;
            for t in den {
                f.write_str(" ")?;
                write_term(f, &t.symbol, -t.power)?;
            }
        }
        Ok(())
    }
}

/// A magnitude expressed in a (possibly compound) unit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Quantity { value, unit }
    }

    pub fn base_value(&self) -> f64 {
        self.unit.to_base(self.value)
    }

    /// Re-express in `target`; `None` when dimensions differ.
    pub fn convert_to(&self, target: &Unit) -> Option<Quantity> {
        if !self.unit.same_dimension(target) {
            return None;
        }
        Some(Quantity {
            value: target.from_base(self.base_value()),
            unit: target.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn km() -> Unit {
        Unit::from_term(UnitTerm::new("km", 1000.0, BaseDimension::Length.dims()))
    }
    fn h() -> Unit {
        Unit::from_term(UnitTerm::new("h", 3600.0, BaseDimension::Time.dims()))
    }

    #[test]
    fn compound_display_and_scale() {
        let speed = km().divide(&h());
        assert_eq!(speed.to_string(), "km / h");
        assert!((speed.scale() - 1000.0 / 3600.0).abs() < 1e-12);
        assert_eq!(km().multiply(&km()).to_string(), "km^2");
        assert_eq!(Unit::default().divide(&h()).to_string(), "h^-1");
    }

    #[test]
    fn cancelling_terms_leaves_dimensionless() {
        let u = km().divide(&km());
        assert!(u.is_empty());
        assert!(u.is_dimensionless());
    }

    #[test]
    fn affine_offset_only_for_single_term() {
        let deg_c = Unit::from_term(
            UnitTerm::new("degC", 1.0, BaseDimension::Temperature.dims()).with_offset(273.15),
        );
        assert!((deg_c.to_base(0.0) - 273.15).abs() < 1e-9);
        assert_eq!(deg_c.powi(2).offset(), 0.0);
    }
}
