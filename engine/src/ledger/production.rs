// Production ledger: groups of produced items with natural output and
// monetary value per year. The horizon is adopted from the consumption
// ledger on load and may diverge afterwards.
use energy_shared::decimal::clean_input;
use energy_shared::models::{
    clamp_start_year, clamp_years_count, ConsumptionRow, Horizon, ProductionGroup, ProductionItem,
    ReportMeta,
};
use tracing::{debug, info, warn};

use super::{check_year, new_id, HorizonSource};
use crate::data::csv_codec;
use crate::data::store::{KeyValueStore, SnapshotStatus, PRODUCTION_GROUPS_KEY};
use crate::data::workbook::{production_workbook, Workbook};
use crate::error::{EngineError, EngineResult};
use crate::horizon::{empty_cells, normalize_groups};

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionLedger {
    horizon: Horizon,
    groups: Vec<ProductionGroup>,
}

impl ProductionLedger {
    pub fn new(source: &dyn HorizonSource) -> Self {
        Self {
            horizon: source.horizon(),
            groups: Vec::new(),
        }
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn groups(&self) -> &[ProductionGroup] {
        &self.groups
    }

    pub fn items(&self) -> impl Iterator<Item = &ProductionItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn item(&self, item_id: &str) -> Option<&ProductionItem> {
        self.items().find(|i| i.id == item_id)
    }

    fn group_mut(&mut self, group_id: &str) -> EngineResult<&mut ProductionGroup> {
        self.groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))
    }

    fn item_mut(&mut self, item_id: &str) -> EngineResult<&mut ProductionItem> {
        self.groups
            .iter_mut()
            .flat_map(|g| g.items.iter_mut())
            .find(|i| i.id == item_id)
            .ok_or_else(|| EngineError::ItemNotFound(item_id.to_string()))
    }

    /// Takes over the other module's start year and year count and
    /// normalizes every item.
    pub fn adopt_horizon(&mut self, source: &dyn HorizonSource) {
        let horizon = source.horizon();
        self.horizon.start_year = clamp_start_year(horizon.start_year);
        self.set_years_count(horizon.years_count);
    }

    pub fn set_start_year(&mut self, start_year: i32) -> i32 {
        self.horizon.start_year = clamp_start_year(start_year);
        self.horizon.start_year
    }

    pub fn set_years_count(&mut self, years_count: usize) -> usize {
        let target = clamp_years_count(years_count);
        self.horizon.years_count = target;
        let changed = normalize_groups(&mut self.groups, target);
        debug!(years_count = target, items_changed = changed, "Changed production horizon");
        target
    }

    pub fn add_group(&mut self, name: &str) -> String {
        let id = new_id();
        self.groups.push(ProductionGroup {
            id: id.clone(),
            name: name.to_string(),
            items: Vec::new(),
        });
        debug!(group_id = %id, "Created production group");
        id
    }

    pub fn rename_group(&mut self, group_id: &str, name: &str) -> EngineResult<()> {
        self.group_mut(group_id)?.name = name.to_string();
        Ok(())
    }

    pub fn delete_group(&mut self, group_id: &str) -> EngineResult<()> {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != group_id);
        if self.groups.len() == before {
            return Err(EngineError::GroupNotFound(group_id.to_string()));
        }
        debug!(group_id, "Deleted production group");
        Ok(())
    }

    /// Appends an empty item to the group and returns its id.
    pub fn add_item(&mut self, group_id: &str) -> EngineResult<String> {
        let years_count = self.horizon.years_count;
        let group = self.group_mut(group_id)?;
        let id = new_id();
        group.items.push(ProductionItem {
            id: id.clone(),
            name: String::new(),
            unit_of_output: String::new(),
            yearly_data: empty_cells(years_count),
        });
        debug!(group_id, item_id = %id, "Created production item");
        Ok(id)
    }

    pub fn set_item_name(&mut self, item_id: &str, name: &str) -> EngineResult<()> {
        self.item_mut(item_id)?.name = name.to_string();
        Ok(())
    }

    pub fn set_item_unit(&mut self, item_id: &str, unit: &str) -> EngineResult<()> {
        self.item_mut(item_id)?.unit_of_output = unit.to_string();
        Ok(())
    }

    pub fn set_natural_output(&mut self, item_id: &str, index: usize, raw: &str) -> EngineResult<()> {
        check_year(index, self.horizon.years_count)?;
        self.item_mut(item_id)?.yearly_data[index].natural_output = clean_input(raw);
        Ok(())
    }

    pub fn set_monetary_value(&mut self, item_id: &str, index: usize, raw: &str) -> EngineResult<()> {
        check_year(index, self.horizon.years_count)?;
        self.item_mut(item_id)?.yearly_data[index].monetary_value = clean_input(raw);
        Ok(())
    }

    pub fn delete_item(&mut self, item_id: &str) -> EngineResult<()> {
        for group in &mut self.groups {
            if let Some(pos) = group.items.iter().position(|i| i.id == item_id) {
                group.items.remove(pos);
                debug!(item_id, "Deleted production item");
                return Ok(());
            }
        }
        Err(EngineError::ItemNotFound(item_id.to_string()))
    }

    fn report_meta(&self, title: &str) -> ReportMeta {
        ReportMeta {
            start_year: self.horizon.start_year,
            years_count: self.horizon.years_count,
            title: title.to_string(),
        }
    }

    pub fn export_csv(&self, title: &str) -> EngineResult<String> {
        csv_codec::export_production(&self.report_meta(title), &self.groups)
    }

    /// Replaces all groups with the file's content; the file's horizon is
    /// adopted. A file without items leaves the ledger untouched.
    pub fn import_csv(&mut self, text: &str) -> EngineResult<usize> {
        let imported = csv_codec::import_production(text, self.horizon.years_count)?;
        let items: usize = imported.groups.iter().map(|g| g.items.len()).sum();
        if items == 0 {
            warn!("CSV import contained no production items, dataset left unchanged");
            return Ok(0);
        }
        if let Some(start_year) = imported.meta.start_year {
            self.horizon.start_year = start_year;
        }
        self.groups = imported.groups;
        self.set_years_count(imported.years_count);
        info!(groups = self.groups.len(), items, "Imported production dataset");
        Ok(items)
    }

    /// Item table plus detail and specific-consumption sheets against the
    /// given consumption rows.
    pub fn workbook(&self, title: &str, rows: &[ConsumptionRow]) -> Workbook {
        production_workbook(&self.report_meta(title), &self.groups, rows)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> EngineResult<()> {
        store.set(PRODUCTION_GROUPS_KEY, &serde_json::to_string(&self.groups)?)?;
        info!(groups = self.groups.len(), "Saved production snapshot");
        Ok(())
    }

    /// Loads stored groups and normalizes them to the source horizon.
    pub fn restore(store: &dyn KeyValueStore, source: &dyn HorizonSource) -> EngineResult<Self> {
        Self::restore_with_status(store, source).map(|(ledger, _)| ledger)
    }

    pub fn restore_with_status(
        store: &dyn KeyValueStore,
        source: &dyn HorizonSource,
    ) -> EngineResult<(Self, SnapshotStatus)> {
        let mut ledger = Self::new(source);
        ledger.horizon.start_year = clamp_start_year(ledger.horizon.start_year);
        let Some(text) = store.get(PRODUCTION_GROUPS_KEY)? else {
            return Ok((ledger, SnapshotStatus::Absent));
        };
        match serde_json::from_str::<Vec<ProductionGroup>>(&text) {
            Ok(groups) => {
                ledger.groups = groups;
                ledger.set_years_count(ledger.horizon.years_count);
                info!(groups = ledger.groups.len(), "Restored production snapshot");
                Ok((ledger, SnapshotStatus::Loaded))
            }
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt production snapshot");
                Ok((ledger, SnapshotStatus::Corrupt))
            }
        }
    }
}

impl HorizonSource for ProductionLedger {
    fn horizon(&self) -> Horizon {
        self.horizon
    }
}
