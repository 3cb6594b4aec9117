// Horizon normalizer: keeps every per-year array index-aligned with the
// active horizon when the year count changes or a snapshot is restored.
use energy_shared::models::{
    ConsumptionCell, ConsumptionRow, ProductionCell, ProductionGroup, ProductionItem,
};

/// An entity carrying one cell per horizon year.
pub trait YearAligned {
    type Cell: Default;

    fn yearly_data(&self) -> &[Self::Cell];
    fn yearly_data_mut(&mut self) -> &mut Vec<Self::Cell>;
}

impl YearAligned for ConsumptionRow {
    type Cell = ConsumptionCell;

    fn yearly_data(&self) -> &[ConsumptionCell] {
        &self.yearly_data
    }

    fn yearly_data_mut(&mut self) -> &mut Vec<ConsumptionCell> {
        &mut self.yearly_data
    }
}

impl YearAligned for ProductionItem {
    type Cell = ProductionCell;

    fn yearly_data(&self) -> &[ProductionCell] {
        &self.yearly_data
    }

    fn yearly_data_mut(&mut self) -> &mut Vec<ProductionCell> {
        &mut self.yearly_data
    }
}

/// A fresh array of empty cells for a horizon of `years_count` years.
pub fn empty_cells<C: Default>(years_count: usize) -> Vec<C> {
    std::iter::repeat_with(C::default).take(years_count).collect()
}

/// Resizes one entity's data to `target` years: trailing years are dropped,
/// missing years are appended empty. Returns whether anything changed; an
/// entity already at `target` is left untouched.
pub fn normalize<E: YearAligned>(entity: &mut E, target: usize) -> bool {
    if entity.yearly_data().len() == target {
        return false;
    }
    entity.yearly_data_mut().resize_with(target, Default::default);
    true
}

/// Normalizes a whole collection, returning how many entities were resized.
pub fn normalize_all<E: YearAligned>(entities: &mut [E], target: usize) -> usize {
    entities
        .iter_mut()
        .map(|entity| normalize(entity, target))
        .filter(|changed| *changed)
        .count()
}

pub fn normalize_groups(groups: &mut [ProductionGroup], target: usize) -> usize {
    groups
        .iter_mut()
        .map(|group| normalize_all(&mut group.items, target))
        .sum()
}
