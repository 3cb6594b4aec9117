// Engine main entry point: restores the stored datasets and writes the
// CSV and XLSX exports.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use energy_engine::config::EngineSettings;
use energy_engine::data::store::JsonFileStore;
use energy_engine::data::{
    consumption_csv_file_name, consumption_xlsx_file_name, production_csv_file_name,
    production_xlsx_file_name, xlsx,
};
use energy_engine::{ConsumptionLedger, ProductionLedger};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const SETTINGS_ENV: &str = "ENERGY_SETTINGS";
const DEFAULT_SETTINGS_PATH: &str = "energy_settings.json";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting energy engine export...");

    let settings_path = std::env::var(SETTINGS_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    let settings = EngineSettings::load(&settings_path)
        .with_context(|| format!("loading settings from {settings_path}"))?;

    let mut store = JsonFileStore::open(&settings.store_dir)
        .with_context(|| format!("opening store {}", settings.store_dir.display()))?;
    info!(store_dir = %store.dir().display(), "Opened snapshot store");
    let (consumption, consumption_status) =
        ConsumptionLedger::restore_with_status(&store, &settings).context("restoring consumption data")?;
    let (production, production_status) =
        ProductionLedger::restore_with_status(&store, &consumption).context("restoring production data")?;

    let export_dir = settings.export_dir.as_path();
    fs::create_dir_all(export_dir)
        .with_context(|| format!("creating export directory {}", export_dir.display()))?;

    let meta = consumption.meta();
    let year = Local::now().year();

    write_text(export_dir, &consumption_csv_file_name(meta.years_count), &consumption.export_csv()?)?;
    let path = export_dir.join(consumption_xlsx_file_name(year));
    xlsx::save_workbook(&consumption.workbook(), &path).with_context(|| format!("writing {}", path.display()))?;

    if production.items().next().is_some() {
        write_text(export_dir, &production_csv_file_name(year), &production.export_csv(&meta.title)?)?;
        let path = export_dir.join(production_xlsx_file_name(year));
        xlsx::save_workbook(&production.workbook(&meta.title, consumption.rows()), &path)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if consumption_status.is_corrupt() {
        warn!(store_dir = %store.dir().display(), "Consumption snapshot unreadable, leaving it in place");
    } else {
        consumption.save(&mut store).context("saving consumption snapshot")?;
    }
    if production_status.is_corrupt() {
        warn!(store_dir = %store.dir().display(), "Production snapshot unreadable, leaving it in place");
    } else {
        production.save(&mut store).context("saving production snapshot")?;
    }

    info!(export_dir = %export_dir.display(), "Export finished");
    Ok(())
}

fn write_text(dir: &Path, name: &str, text: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "Wrote CSV export");
    Ok(())
}
