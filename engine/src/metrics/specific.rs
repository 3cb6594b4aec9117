// Specific consumption: resource quantity and cost per unit of a
// production item's natural output, year by year.
use energy_shared::models::{ConsumptionRow, ProductionItem};

use super::YearlySeries;

/// Natural output usable as a divisor: finite and strictly positive.
pub fn denominator(item: &ProductionItem, index: usize) -> Option<f64> {
    item.primary(index).filter(|output| *output > 0.0)
}

pub fn specific_qty(item: &ProductionItem, row: &ConsumptionRow, index: usize) -> Option<f64> {
    let output = denominator(item, index)?;
    row.primary(index).map(|quantity| quantity / output)
}

pub fn specific_cost(item: &ProductionItem, row: &ConsumptionRow, index: usize) -> Option<f64> {
    let output = denominator(item, index)?;
    row.monetary(index).map(|cost| cost / output)
}

/// Sum of the defined per-resource ratios; `None` when the year has no
/// usable output at all.
pub fn total_specific(item: &ProductionItem, rows: &[ConsumptionRow], index: usize) -> Option<f64> {
    denominator(item, index)?;
    Some(
        rows.iter()
            .filter_map(|row| specific_qty(item, row, index))
            .fold(0.0, |acc, v| acc + v),
    )
}

pub fn total_specific_cost(item: &ProductionItem, rows: &[ConsumptionRow], index: usize) -> Option<f64> {
    denominator(item, index)?;
    Some(
        rows.iter()
            .filter_map(|row| specific_cost(item, row, index))
            .fold(0.0, |acc, v| acc + v),
    )
}

/// One consumption resource's ratios against one production item.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificLine {
    pub resource_name: String,
    pub resource_unit: String,
    pub quantity: Vec<Option<f64>>,
    pub cost: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecificTable {
    pub lines: Vec<SpecificLine>,
    pub total_quantity: Vec<Option<f64>>,
    pub total_cost: Vec<Option<f64>>,
}

pub fn specific_table(item: &ProductionItem, rows: &[ConsumptionRow], years_count: usize) -> SpecificTable {
    let years = 0..years_count;
    let lines = rows
        .iter()
        .map(|row| SpecificLine {
            resource_name: row.display_name.clone(),
            resource_unit: row.unit.clone(),
            quantity: years.clone().map(|i| specific_qty(item, row, i)).collect(),
            cost: years.clone().map(|i| specific_cost(item, row, i)).collect(),
        })
        .collect();
    SpecificTable {
        lines,
        total_quantity: years.clone().map(|i| total_specific(item, rows, i)).collect(),
        total_cost: years.map(|i| total_specific_cost(item, rows, i)).collect(),
    }
}
