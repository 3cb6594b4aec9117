// Consumption ledger: resource rows plus the shared report metadata.
use energy_shared::decimal::{clean_input, parse_user_number};
use energy_shared::models::{clamp_start_year, clamp_years_count, ConsumptionRow, Horizon, ReportMeta};
use tracing::{debug, info, warn};

use super::{check_year, new_id, HorizonSource};
use crate::catalog;
use crate::config::EngineSettings;
use crate::data::csv_codec;
use crate::data::store::{KeyValueStore, SnapshotStatus, META_KEY, ROWS_KEY};
use crate::data::workbook::{consumption_workbook, Workbook};
use crate::error::{EngineError, EngineResult};
use crate::horizon::{empty_cells, normalize_all};
use crate::metrics::consumption::{totals_trend, year_totals, TotalsTrend, YearTotals};

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionLedger {
    meta: ReportMeta,
    rows: Vec<ConsumptionRow>,
    default_resource_id: String,
}

impl ConsumptionLedger {
    /// A fresh dataset: default metadata and one default row.
    pub fn new(settings: &EngineSettings) -> Self {
        let mut ledger = Self::empty(settings.default_meta(), &settings.default_resource_id);
        ledger.create_row();
        ledger
    }

    fn empty(meta: ReportMeta, default_resource_id: &str) -> Self {
        let meta = ReportMeta {
            start_year: clamp_start_year(meta.start_year),
            years_count: clamp_years_count(meta.years_count),
            ..meta
        };
        Self {
            meta,
            rows: Vec::new(),
            default_resource_id: default_resource_id.to_string(),
        }
    }

    pub fn meta(&self) -> &ReportMeta {
        &self.meta
    }

    pub fn rows(&self) -> &[ConsumptionRow] {
        &self.rows
    }

    pub fn row(&self, row_id: &str) -> Option<&ConsumptionRow> {
        self.rows.iter().find(|r| r.id == row_id)
    }

    fn row_mut(&mut self, row_id: &str) -> EngineResult<&mut ConsumptionRow> {
        self.rows
            .iter_mut()
            .find(|r| r.id == row_id)
            .ok_or_else(|| EngineError::RowNotFound(row_id.to_string()))
    }

    fn custom_row_mut(&mut self, row_id: &str) -> EngineResult<&mut ConsumptionRow> {
        let row = self.row_mut(row_id)?;
        if !catalog::is_custom(&row.resource_id) {
            return Err(EngineError::NotCustomResource(row_id.to_string()));
        }
        Ok(row)
    }

    /// Appends a row for the default resource and returns its id.
    pub fn create_row(&mut self) -> String {
        let def = catalog::resolve(&self.default_resource_id);
        let row = ConsumptionRow {
            id: new_id(),
            resource_id: def.id.to_string(),
            display_name: def.display_name.to_string(),
            unit: def.natural_unit.to_string(),
            coefficient: def.coefficient,
            yearly_data: empty_cells(self.meta.years_count),
            note: String::new(),
        };
        let id = row.id.clone();
        self.rows.push(row);
        debug!(row_id = %id, resource_id = def.id, "Created consumption row");
        id
    }

    /// Snapshots the catalog entry's name, unit and coefficient onto the row.
    pub fn change_resource_type(&mut self, row_id: &str, resource_id: &str) -> EngineResult<()> {
        let def = catalog::resolve(resource_id);
        let row = self.row_mut(row_id)?;
        row.resource_id = def.id.to_string();
        row.display_name = def.display_name.to_string();
        row.unit = def.natural_unit.to_string();
        row.coefficient = def.coefficient;
        debug!(row_id, resource_id = def.id, "Changed resource type");
        Ok(())
    }

    /// Removes a row; an emptied ledger must be reseeded with `ensure_seeded`.
    pub fn delete_row(&mut self, row_id: &str) -> EngineResult<()> {
        let before = self.rows.len();
        self.rows.retain(|r| r.id != row_id);
        if self.rows.len() == before {
            return Err(EngineError::RowNotFound(row_id.to_string()));
        }
        debug!(row_id, remaining = self.rows.len(), "Deleted consumption row");
        Ok(())
    }

    /// Returns true when a default row had to be added.
    pub fn ensure_seeded(&mut self) -> bool {
        if self.rows.is_empty() {
            self.create_row();
            true
        } else {
            false
        }
    }

    /// Resets to exactly one default row; metadata is kept.
    pub fn clear_all(&mut self) {
        self.rows.clear();
        self.create_row();
        info!("Cleared consumption dataset");
    }

    pub fn set_title(&mut self, title: &str) {
        self.meta.title = title.to_string();
    }

    /// Relabels the years; cell positions are untouched. The year is
    /// clamped into the supported range and the applied value returned.
    pub fn set_start_year(&mut self, start_year: i32) -> i32 {
        self.meta.start_year = clamp_start_year(start_year);
        self.meta.start_year
    }

    /// Clamps the count and normalizes every row in the same call. Returns
    /// the count actually applied.
    pub fn set_years_count(&mut self, years_count: usize) -> usize {
        let target = clamp_years_count(years_count);
        self.meta.years_count = target;
        let changed = normalize_all(&mut self.rows, target);
        debug!(years_count = target, rows_changed = changed, "Changed horizon");
        target
    }

    pub fn set_quantity(&mut self, row_id: &str, index: usize, raw: &str) -> EngineResult<()> {
        check_year(index, self.meta.years_count)?;
        let row = self.row_mut(row_id)?;
        row.yearly_data[index].quantity = clean_input(raw);
        Ok(())
    }

    pub fn set_monetary_cost(&mut self, row_id: &str, index: usize, raw: &str) -> EngineResult<()> {
        check_year(index, self.meta.years_count)?;
        let row = self.row_mut(row_id)?;
        row.yearly_data[index].monetary_cost = clean_input(raw);
        Ok(())
    }

    pub fn set_note(&mut self, row_id: &str, note: &str) -> EngineResult<()> {
        self.row_mut(row_id)?.note = note.to_string();
        Ok(())
    }

    pub fn set_custom_name(&mut self, row_id: &str, name: &str) -> EngineResult<()> {
        self.custom_row_mut(row_id)?.display_name = name.to_string();
        Ok(())
    }

    pub fn set_custom_unit(&mut self, row_id: &str, unit: &str) -> EngineResult<()> {
        self.custom_row_mut(row_id)?.unit = unit.to_string();
        Ok(())
    }

    /// Unparseable input is stored as a non-finite coefficient, which
    /// contributes nothing to standard fuel.
    pub fn set_custom_coefficient(&mut self, row_id: &str, raw: &str) -> EngineResult<()> {
        self.custom_row_mut(row_id)?.coefficient = parse_user_number(raw).unwrap_or(f64::NAN);
        Ok(())
    }

    pub fn year_totals(&self) -> Vec<YearTotals> {
        year_totals(&self.rows, self.meta.years_count)
    }

    pub fn totals_trend(&self) -> TotalsTrend {
        totals_trend(&self.rows, self.meta.years_count)
    }

    pub fn export_csv(&self) -> EngineResult<String> {
        csv_codec::export_consumption(&self.meta, &self.rows)
    }

    /// Replaces the dataset with the file's rows and metadata. A file
    /// without any row leaves the ledger untouched and returns 0.
    pub fn import_csv(&mut self, text: &str) -> EngineResult<usize> {
        let imported = csv_codec::import_consumption(text, self.meta.years_count)?;
        if imported.rows.is_empty() {
            warn!("CSV import contained no rows, dataset left unchanged");
            return Ok(0);
        }
        if let Some(title) = imported.meta.title {
            self.meta.title = title;
        }
        if let Some(start_year) = imported.meta.start_year {
            self.meta.start_year = start_year;
        }
        self.meta.years_count = clamp_years_count(imported.years_count);
        self.rows = imported.rows;
        normalize_all(&mut self.rows, self.meta.years_count);
        info!(rows = self.rows.len(), years_count = self.meta.years_count, "Imported consumption dataset");
        Ok(self.rows.len())
    }

    pub fn workbook(&self) -> Workbook {
        consumption_workbook(&self.meta, &self.rows)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> EngineResult<()> {
        store.set(META_KEY, &serde_json::to_string(&self.meta)?)?;
        store.set(ROWS_KEY, &serde_json::to_string(&self.rows)?)?;
        info!(rows = self.rows.len(), "Saved consumption snapshot");
        Ok(())
    }

    /// Loads the stored snapshot, normalizing every row to the stored
    /// horizon. Missing or corrupt snapshots fall back to a fresh dataset.
    pub fn restore(store: &dyn KeyValueStore, settings: &EngineSettings) -> EngineResult<Self> {
        Self::restore_with_status(store, settings).map(|(ledger, _)| ledger)
    }

    /// Same as `restore`, also reporting whether the fallback was taken
    /// because the stored snapshot could not be read.
    pub fn restore_with_status(
        store: &dyn KeyValueStore,
        settings: &EngineSettings,
    ) -> EngineResult<(Self, SnapshotStatus)> {
        let (Some(meta_text), Some(rows_text)) = (store.get(META_KEY)?, store.get(ROWS_KEY)?) else {
            debug!("No consumption snapshot, starting fresh");
            return Ok((Self::new(settings), SnapshotStatus::Absent));
        };
        let parsed = serde_json::from_str::<ReportMeta>(&meta_text).and_then(|meta| {
            serde_json::from_str::<Vec<ConsumptionRow>>(&rows_text).map(|rows| (meta, rows))
        });
        let (meta, rows) = match parsed {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Ignoring corrupt consumption snapshot");
                return Ok((Self::new(settings), SnapshotStatus::Corrupt));
            }
        };

        let mut ledger = Self::empty(meta, &settings.default_resource_id);
        ledger.rows = rows;
        let changed = normalize_all(&mut ledger.rows, ledger.meta.years_count);
        ledger.ensure_seeded();
        info!(
            rows = ledger.rows.len(),
            years_count = ledger.meta.years_count,
            rows_normalized = changed,
            "Restored consumption snapshot"
        );
        Ok((ledger, SnapshotStatus::Loaded))
    }
}

impl HorizonSource for ConsumptionLedger {
    fn horizon(&self) -> Horizon {
        self.meta.horizon()
    }
}
