// Consumption-module metrics: standard fuel, unit costs, per-year totals
// and the per-resource summaries behind the charts and export sheets.
use energy_shared::models::ConsumptionRow;

use super::{divide, sum_defined, year_over_year, YearDelta, YearlySeries};

/// Non-finite coefficients contribute nothing instead of poisoning totals.
pub fn effective_coefficient(row: &ConsumptionRow) -> f64 {
    if row.coefficient.is_finite() {
        row.coefficient
    } else {
        0.0
    }
}

pub fn standard_fuel_qty(row: &ConsumptionRow, index: usize) -> Option<f64> {
    row.primary(index)
        .map(|quantity| quantity * effective_coefficient(row))
        .filter(|v| v.is_finite())
}

/// Cost per natural unit.
pub fn unit_cost(row: &ConsumptionRow, index: usize) -> Option<f64> {
    divide(row.monetary(index), row.primary(index))
}

/// Cost per unit of standard fuel.
pub fn cost_per_standard_fuel(row: &ConsumptionRow, index: usize) -> Option<f64> {
    divide(row.monetary(index), standard_fuel_qty(row, index))
}

/// Every derived value of one row for one year.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceYear {
    pub quantity: Option<f64>,
    pub money: Option<f64>,
    pub standard_fuel: Option<f64>,
    pub unit_cost: Option<f64>,
    pub cost_per_standard_fuel: Option<f64>,
}

pub fn resource_year(row: &ConsumptionRow, index: usize) -> ResourceYear {
    ResourceYear {
        quantity: row.primary(index),
        money: row.monetary(index),
        standard_fuel: standard_fuel_qty(row, index),
        unit_cost: unit_cost(row, index),
        cost_per_standard_fuel: cost_per_standard_fuel(row, index),
    }
}

pub fn resource_years(row: &ConsumptionRow, years_count: usize) -> Vec<ResourceYear> {
    (0..years_count).map(|i| resource_year(row, i)).collect()
}

pub fn total_money(rows: &[ConsumptionRow], index: usize) -> f64 {
    sum_defined(rows.iter().map(|r| r.monetary(index)))
}

pub fn total_standard_fuel(rows: &[ConsumptionRow], index: usize) -> f64 {
    sum_defined(rows.iter().map(|r| standard_fuel_qty(r, index)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearTotals {
    pub money: f64,
    pub standard_fuel: f64,
}

pub fn year_totals(rows: &[ConsumptionRow], years_count: usize) -> Vec<YearTotals> {
    (0..years_count)
        .map(|i| YearTotals {
            money: total_money(rows, i),
            standard_fuel: total_standard_fuel(rows, i),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TotalsTrend {
    pub standard_fuel: Vec<YearDelta>,
    pub money: Vec<YearDelta>,
}

pub fn totals_trend(rows: &[ConsumptionRow], years_count: usize) -> TotalsTrend {
    let totals = year_totals(rows, years_count);
    let fuel: Vec<f64> = totals.iter().map(|t| t.standard_fuel).collect();
    let money: Vec<f64> = totals.iter().map(|t| t.money).collect();
    TotalsTrend {
        standard_fuel: year_over_year(&fuel),
        money: year_over_year(&money),
    }
}

/// Per-resource series with deltas, one entry per horizon year.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTrend {
    pub quantity: Vec<YearDelta>,
    pub standard_fuel: Vec<YearDelta>,
    pub money: Vec<YearDelta>,
    pub unit_cost: Vec<YearDelta>,
}

pub fn resource_trend(row: &ConsumptionRow, years_count: usize) -> ResourceTrend {
    let years = resource_years(row, years_count);
    let pick = |f: fn(&ResourceYear) -> Option<f64>| -> Vec<YearDelta> {
        let series: Vec<Option<f64>> = years.iter().map(f).collect();
        year_over_year(&series)
    };
    ResourceTrend {
        quantity: pick(|y| y.quantity),
        standard_fuel: pick(|y| y.standard_fuel),
        money: pick(|y| y.money),
        unit_cost: pick(|y| y.unit_cost),
    }
}

/// Horizon-wide sums for one resource; unusable cells count as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSummary {
    pub name: String,
    pub quantity: f64,
    pub money: f64,
    pub standard_fuel: f64,
}

pub fn resource_summaries(rows: &[ConsumptionRow], years_count: usize) -> Vec<ResourceSummary> {
    rows.iter()
        .map(|row| ResourceSummary {
            name: row.display_name.clone(),
            quantity: sum_defined((0..years_count).map(|i| row.primary(i))),
            money: sum_defined((0..years_count).map(|i| row.monetary(i))),
            standard_fuel: sum_defined((0..years_count).map(|i| standard_fuel_qty(row, i))),
        })
        .collect()
}

/// One slice of the per-year structure (pie) breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureSlice {
    pub name: String,
    pub money: f64,
    pub standard_fuel: f64,
}

pub fn structure_for_year(rows: &[ConsumptionRow], index: usize) -> Vec<StructureSlice> {
    rows.iter()
        .map(|row| StructureSlice {
            name: row.display_name.clone(),
            money: row.monetary(index).unwrap_or(0.0),
            standard_fuel: standard_fuel_qty(row, index).unwrap_or(0.0),
        })
        .collect()
}
