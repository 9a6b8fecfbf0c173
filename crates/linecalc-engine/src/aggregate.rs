use linecalc_common::Value;

/// Running average, total and subtotal for one pass.
///
/// Any non-numeric answer makes all three unavailable. Only a block
/// boundary (blank line, or a line with no result) revives the subtotal;
/// average and total stay unavailable until the next pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunningStats {
    sum: f64,
    count: usize,
    total: f64,
    subtotal: f64,
    invalid_avg: bool,
    invalid_total: bool,
    invalid_subtotal: bool,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the answer of a line that produced a result.
    pub fn record(&mut self, value: &Value) {
        let Some(n) = value.as_number() else {
            self.invalid_avg = true;
            self.invalid_total = true;
            self.invalid_subtotal = true;
            return;
        };
        if !self.invalid_avg {
            self.sum += n;
            self.count += 1;
        }
        if !self.invalid_total {
            self.total += n;
        }
        if !self.invalid_subtotal {
            self.subtotal += n;
        }
    }

    /// Start a fresh subtotal block.
    pub fn block_boundary(&mut self) {
        self.subtotal = 0.0;
        self.invalid_subtotal = false;
    }

    /// Mean of the numeric answers so far; `0` before any.
    pub fn average(&self) -> Option<f64> {
        match (self.invalid_avg, self.count) {
            (true, _) => None,
            (false, 0) => Some(0.0),
            (false, n) => Some(self.sum / n as f64),
        }
    }

    pub fn total(&self) -> Option<f64> {
        (!self.invalid_total).then_some(self.total)
    }

    pub fn subtotal(&self) -> Option<f64> {
        (!self.invalid_subtotal).then_some(self.subtotal)
    }

    /// `(name, value)` for each aggregate keyword.
    pub fn entries(&self) -> [(&'static str, Option<f64>); 3] {
        [
            ("avg", self.average()),
            ("total", self.total()),
            ("subtotal", self.subtotal()),
        ]
    }
}
