//! Unit registry: maps unit names (and their spelled-out aliases) to
//! scale factors over SI base dimensions.

use linecalc_common::{BaseDimension, DIMENSIONLESS, Dimensions, Unit, UnitTerm};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use BaseDimension::*;

fn dims(parts: &[(BaseDimension, i8)]) -> Dimensions {
    let mut d = DIMENSIONLESS;
    for &(base, power) in parts {
        d[base as usize] += power;
    }
    d
}

struct UnitDef {
    names: &'static [&'static str],
    scale: f64,
    offset: f64,
    dims: Dimensions,
}

fn def(names: &'static [&'static str], scale: f64, parts: &[(BaseDimension, i8)]) -> UnitDef {
    UnitDef {
        names,
        scale,
        offset: 0.0,
        dims: dims(parts),
    }
}

const JULIAN_YEAR: f64 = 31_557_600.0;

static BUILTIN_UNITS: Lazy<Vec<UnitDef>> = Lazy::new(|| {
    let length = [(Length, 1)];
    let mass = [(Mass, 1)];
    let time = [(Time, 1)];
    let area = [(Length, 2)];
    let volume = [(Length, 3)];
    let speed = [(Length, 1), (Time, -1)];
    let energy = [(Mass, 1), (Length, 2), (Time, -2)];
    let power = [(Mass, 1), (Length, 2), (Time, -3)];
    let pressure = [(Mass, 1), (Length, -1), (Time, -2)];
    let force = [(Mass, 1), (Length, 1), (Time, -2)];
    let bits = [(Information, 1)];
    let angle = [(Angle, 1)];

    vec![
        // length
        def(&["m", "meter", "meters", "metre", "metres"], 1.0, &length),
        def(&["km", "kilometer", "kilometers", "kilometre", "kilometres"], 1e3, &length),
        def(&["cm", "centimeter", "centimeters"], 1e-2, &length),
        def(&["mm", "millimeter", "millimeters"], 1e-3, &length),
        def(&["um", "micrometer", "micrometers"], 1e-6, &length),
        def(&["nm", "nanometer", "nanometers"], 1e-9, &length),
        def(&["mi", "mile", "miles"], 1609.344, &length),
        def(&["yd", "yard", "yards"], 0.9144, &length),
        def(&["ft", "foot", "feet"], 0.3048, &length),
        def(&["inch", "inches"], 0.0254, &length),
        def(&["nmi"], 1852.0, &length),
        // mass
        def(&["g", "gram", "grams"], 1e-3, &mass),
        def(&["kg", "kilogram", "kilograms"], 1.0, &mass),
        def(&["mg", "milligram", "milligrams"], 1e-6, &mass),
        def(&["t", "tonne", "tonnes"], 1e3, &mass),
        def(&["lb", "lbs", "pound", "pounds"], 0.453_592_37, &mass),
        def(&["oz", "ounce", "ounces"], 0.028_349_523_125, &mass),
        def(&["stone"], 6.350_293_18, &mass),
        // time
        def(&["ms", "millisecond", "milliseconds"], 1e-3, &time),
        def(&["s", "sec", "secs", "second", "seconds"], 1.0, &time),
        def(&["min", "mins", "minute", "minutes"], 60.0, &time),
        def(&["h", "hr", "hrs", "hour", "hours"], 3600.0, &time),
        def(&["day", "days"], 86_400.0, &time),
        def(&["week", "weeks"], 604_800.0, &time),
        def(&["month", "months"], JULIAN_YEAR / 12.0, &time),
        def(&["quarter", "quarters"], JULIAN_YEAR / 4.0, &time),
        def(&["year", "years", "yr"], JULIAN_YEAR, &time),
        def(&["decade", "decades"], JULIAN_YEAR * 10.0, &time),
        def(&["century", "centuries"], JULIAN_YEAR * 100.0, &time),
        def(&["millennium", "millennia"], JULIAN_YEAR * 1000.0, &time),
        // area
        def(&["ha", "hectare", "hectares"], 1e4, &area),
        def(&["acre", "acres"], 4046.856_422_4, &area),
        // volume
        def(&["L", "l", "liter", "liters", "litre", "litres"], 1e-3, &volume),
        def(&["mL", "ml", "milliliter", "milliliters"], 1e-6, &volume),
        def(&["gal", "gallon", "gallons"], 3.785_411_784e-3, &volume),
        def(&["cup", "cups"], 2.365_882_365e-4, &volume),
        // speed
        def(&["mph"], 0.447_04, &speed),
        def(&["kph", "kmh"], 1e3 / 3600.0, &speed),
        def(&["knot", "knots"], 1852.0 / 3600.0, &speed),
        // energy / power / pressure / force / frequency
        def(&["J", "joule", "joules"], 1.0, &energy),
        def(&["kJ"], 1e3, &energy),
        def(&["cal", "calorie", "calories"], 4.184, &energy),
        def(&["kcal"], 4184.0, &energy),
        def(&["Wh"], 3600.0, &energy),
        def(&["kWh"], 3.6e6, &energy),
        def(&["W", "watt", "watts"], 1.0, &power),
        def(&["kW"], 1e3, &power),
        def(&["Pa"], 1.0, &pressure),
        def(&["kPa"], 1e3, &pressure),
        def(&["bar"], 1e5, &pressure),
        def(&["psi"], 6894.757_293_168, &pressure),
        def(&["N", "newton", "newtons"], 1.0, &force),
        def(&["Hz"], 1.0, &[(Time, -1)]),
        // temperature
        def(&["K", "kelvin"], 1.0, &[(Temperature, 1)]),
        UnitDef {
            names: &["degC", "celsius"],
            scale: 1.0,
            offset: 273.15,
            dims: dims(&[(Temperature, 1)]),
        },
        UnitDef {
            names: &["degF", "fahrenheit"],
            scale: 5.0 / 9.0,
            offset: 459.67,
            dims: dims(&[(Temperature, 1)]),
        },
        // angle
        def(&["rad", "radian", "radians"], 1.0, &angle),
        def(&["deg", "degree", "degrees"], std::f64::consts::PI / 180.0, &angle),
        // information
        def(&["b", "bit", "bits"], 1.0, &bits),
        def(&["B", "byte", "bytes"], 8.0, &bits),
        def(&["kB"], 8e3, &bits),
        def(&["MB"], 8e6, &bits),
        def(&["GB"], 8e9, &bits),
        def(&["TB"], 8e12, &bits),
        def(&["KiB"], 8.0 * 1024.0, &bits),
        def(&["MiB"], 8.0 * 1024.0 * 1024.0, &bits),
        def(&["GiB"], 8.0 * 1024.0 * 1024.0 * 1024.0, &bits),
        // currency; other codes arrive through `register_currency`
        def(&["USD"], 1.0, &[(Currency, 1)]),
    ]
});

/// Name → unit lookup. Built-in units are shared; currencies are per registry.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    units: FxHashMap<String, UnitTerm>,
}

impl Default for UnitRegistry {
    fn default() -> Self {
        let mut units = FxHashMap::default();
        for d in BUILTIN_UNITS.iter() {
            for &name in d.names {
                units.insert(
                    name.to_string(),
                    UnitTerm::new(name, d.scale, d.dims).with_offset(d.offset),
                );
            }
        }
        UnitRegistry { units }
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, name: &str) -> Option<Unit> {
        self.units.get(name).cloned().map(Unit::from_term)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    /// Register or update a currency. `per_usd` is how many units of `code`
    /// one US dollar buys.
    pub fn register_currency(&mut self, code: &str, per_usd: f64) -> bool {
        if !(per_usd.is_finite() && per_usd > 0.0) || code.is_empty() {
            return false;
        }
        if let Some(existing) = self.units.get(code) {
            if existing.dims != Currency.dims() {
                return false;
            }
        }
        self.units.insert(
            code.to_string(),
            UnitTerm::new(code, 1.0 / per_usd, Currency.dims()),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linecalc_common::Quantity;

    #[test]
    fn aliases_share_scale() {
        let reg = UnitRegistry::new();
        let hours = reg.lookup("hours").unwrap();
        let h = reg.lookup("h").unwrap();
        assert_eq!(hours.scale(), h.scale());
        assert_eq!(hours.to_string(), "hours");
    }

    #[test]
    fn durations_convert_to_hours() {
        let reg = UnitRegistry::new();
        let q = Quantity::new(2.0, reg.lookup("days").unwrap());
        let hours = q.convert_to(&reg.lookup("hours").unwrap()).unwrap();
        assert!((hours.value - 48.0).abs() < 1e-9);
    }

    #[test]
    fn temperature_offsets() {
        let reg = UnitRegistry::new();
        let q = Quantity::new(100.0, reg.lookup("degC").unwrap());
        let f = q.convert_to(&reg.lookup("degF").unwrap()).unwrap();
        assert!((f.value - 212.0).abs() < 1e-9);
    }

    #[test]
    fn currency_registration() {
        let mut reg = UnitRegistry::new();
        assert!(!reg.contains("EUR"));
        assert!(reg.register_currency("EUR", 0.5));
        assert!(!reg.register_currency("km", 2.0));
        assert!(!reg.register_currency("GBP", 0.0));
        let eur = Quantity::new(10.0, reg.lookup("EUR").unwrap());
        let usd = eur.convert_to(&reg.lookup("USD").unwrap()).unwrap();
        assert!((usd.value - 20.0).abs() < 1e-9);
    }
}
