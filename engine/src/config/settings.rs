// Engine settings, loaded from a JSON file; every field has a default.
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use energy_shared::models::{clamp_start_year, clamp_years_count, ReportMeta};
use serde::Deserialize;
use tracing::{debug, info};

use crate::catalog;
use crate::error::{EngineError, EngineResult};

pub const DEFAULT_TITLE: &str = "Расчёт по предприятию";
pub const DEFAULT_YEARS_COUNT: usize = 5;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub default_title: String,
    /// `None` means four years before the current one.
    pub default_start_year: Option<i32>,
    pub default_years_count: usize,
    pub default_resource_id: String,
    pub store_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            default_title: DEFAULT_TITLE.to_string(),
            default_start_year: None,
            default_years_count: DEFAULT_YEARS_COUNT,
            default_resource_id: catalog::DEFAULT_RESOURCE_ID.to_string(),
            store_dir: PathBuf::from("energy_store"),
            export_dir: PathBuf::from("exports"),
        }
    }
}

impl EngineSettings {
    /// Defaults when the file is absent; a `Config` error when it is present
    /// but unreadable.
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        let settings: EngineSettings = serde_json::from_str(&text)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        if catalog::find_resource(&settings.default_resource_id).is_none() {
            return Err(EngineError::Config(format!(
                "unknown default_resource_id '{}'",
                settings.default_resource_id
            )));
        }
        info!(path = %path.display(), "Loaded engine settings");
        Ok(settings)
    }

    pub fn start_year(&self) -> i32 {
        let year = self
            .default_start_year
            .unwrap_or_else(|| Local::now().year() - 4);
        clamp_start_year(year)
    }

    pub fn years_count(&self) -> usize {
        clamp_years_count(self.default_years_count)
    }

    /// Metadata record a fresh dataset starts from.
    pub fn default_meta(&self) -> ReportMeta {
        ReportMeta {
            start_year: self.start_year(),
            years_count: self.years_count(),
            title: self.default_title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file_gives_defaults() {
        let settings = EngineSettings::load("/definitely/not/here.json").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert_eq!(settings.years_count(), 5);
        assert_eq!(settings.start_year(), Local::now().year() - 4);
        assert_eq!(settings.default_meta().title, DEFAULT_TITLE);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_start_year": 2019, "default_years_count": 40}}"#).unwrap();
        let settings = EngineSettings::load(file.path()).unwrap();
        assert_eq!(settings.start_year(), 2019);
        assert_eq!(settings.years_count(), 10);
        assert_eq!(settings.default_resource_id, "electricity");
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(EngineSettings::load(file.path()), Err(EngineError::Config(_))));

        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_resource_id": "plutonium"}}"#).unwrap();
        assert!(matches!(EngineSettings::load(file.path()), Err(EngineError::Config(_))));
    }
}
