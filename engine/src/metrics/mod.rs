// Derived-metrics engine: pure functions over one entity plus its
// index-aligned year list. Consumption rows and production items share the
// same series accessors so deltas and ratios are computed by one routine.
pub mod consumption;
pub mod deltas;
pub mod specific;

use energy_shared::decimal::{safe_divide, usable_number};
use energy_shared::models::{ConsumptionRow, ProductionItem};

pub use deltas::{year_over_year, YearDelta};

/// Common view over both entity shapes: a natural (primary) series and a
/// monetary series, one value per horizon year. Unusable cells are `None`.
pub trait YearlySeries {
    fn label(&self) -> &str;

    /// Quantity consumed (rows) or natural output produced (items).
    fn primary(&self, index: usize) -> Option<f64>;

    /// Cost paid (rows) or value of output (items).
    fn monetary(&self, index: usize) -> Option<f64>;
}

impl YearlySeries for ConsumptionRow {
    fn label(&self) -> &str {
        &self.display_name
    }

    fn primary(&self, index: usize) -> Option<f64> {
        self.yearly_data
            .get(index)
            .and_then(|cell| usable_number(&cell.quantity))
    }

    fn monetary(&self, index: usize) -> Option<f64> {
        self.yearly_data
            .get(index)
            .and_then(|cell| usable_number(&cell.monetary_cost))
    }
}

impl YearlySeries for ProductionItem {
    fn label(&self) -> &str {
        &self.name
    }

    fn primary(&self, index: usize) -> Option<f64> {
        self.yearly_data
            .get(index)
            .and_then(|cell| usable_number(&cell.natural_output))
    }

    fn monetary(&self, index: usize) -> Option<f64> {
        self.yearly_data
            .get(index)
            .and_then(|cell| usable_number(&cell.monetary_value))
    }
}

pub fn primary_series<E: YearlySeries + ?Sized>(entity: &E, years_count: usize) -> Vec<Option<f64>> {
    (0..years_count).map(|i| entity.primary(i)).collect()
}

pub fn monetary_series<E: YearlySeries + ?Sized>(entity: &E, years_count: usize) -> Vec<Option<f64>> {
    (0..years_count).map(|i| entity.monetary(i)).collect()
}

/// `safe_divide` lifted over undefined operands.
pub fn divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) => safe_divide(n, d),
        _ => None,
    }
}

/// Sum that skips undefined terms (they count as zero).
pub fn sum_defined<I: IntoIterator<Item = Option<f64>>>(terms: I) -> f64 {
    terms
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold(0.0, |acc, v| acc + v)
}
