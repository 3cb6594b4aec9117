// Energy passport, section 1: design conditions of the building.
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::store::{KeyValueStore, PASSPORT_KEY};
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterDefinition {
    pub number: usize,
    pub name: &'static str,
    pub symbol: &'static str,
    pub unit: &'static str,
}

pub const DESIGN_CONDITIONS: [ParameterDefinition; 7] = [
    ParameterDefinition {
        number: 1,
        name: "Расчётная температура наружного воздуха для проектирования теплозащиты",
        symbol: "t_н",
        unit: "°C",
    },
    ParameterDefinition {
        number: 2,
        name: "Средняя температура наружного воздуха за отопительный период",
        symbol: "t_от",
        unit: "°C",
    },
    ParameterDefinition {
        number: 3,
        name: "Продолжительность отопительного периода",
        symbol: "z_от",
        unit: "сут/год",
    },
    ParameterDefinition {
        number: 4,
        name: "Градусо-сутки отопительного периода",
        symbol: "ГСОП",
        unit: "°C·сут/год",
    },
    ParameterDefinition {
        number: 5,
        name: "Расчётная температура внутреннего воздуха для проектирования теплозащиты",
        symbol: "t_в",
        unit: "°C",
    },
    ParameterDefinition {
        number: 6,
        name: "Расчётная температура чердака",
        symbol: "t_черд",
        unit: "°C",
    },
    ParameterDefinition {
        number: 7,
        name: "Расчётная температура техподполья",
        symbol: "t_подп",
        unit: "°C",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassportParameter {
    pub definition: ParameterDefinition,
    /// Free text as entered.
    pub value: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredValue {
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnergyPassport {
    parameters: Vec<PassportParameter>,
}

impl Default for EnergyPassport {
    fn default() -> Self {
        Self::new()
    }
}

impl EnergyPassport {
    pub fn new() -> Self {
        Self {
            parameters: DESIGN_CONDITIONS
                .iter()
                .map(|definition| PassportParameter {
                    definition: *definition,
                    value: String::new(),
                })
                .collect(),
        }
    }

    pub fn parameters(&self) -> &[PassportParameter] {
        &self.parameters
    }

    pub fn value(&self, number: usize) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.definition.number == number)
            .map(|p| p.value.as_str())
    }

    pub fn set_value(&mut self, number: usize, raw: &str) -> EngineResult<()> {
        let parameter = self
            .parameters
            .iter_mut()
            .find(|p| p.definition.number == number)
            .ok_or(EngineError::PassportParameterNotFound(number))?;
        parameter.value = raw.to_string();
        debug!(number, "Updated passport parameter");
        Ok(())
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> EngineResult<()> {
        let stored: Vec<StoredValue> = self
            .parameters
            .iter()
            .map(|p| StoredValue {
                value: Some(p.value.clone()),
            })
            .collect();
        store.set(PASSPORT_KEY, &serde_json::to_string(&stored)?)
    }

    /// Stored values map onto the fixed table by position; missing entries
    /// stay blank and extra ones are ignored.
    pub fn restore(store: &dyn KeyValueStore) -> EngineResult<Self> {
        let mut passport = Self::new();
        let Some(text) = store.get(PASSPORT_KEY)? else {
            return Ok(passport);
        };
        match serde_json::from_str::<Vec<StoredValue>>(&text) {
            Ok(stored) => {
                for (parameter, saved) in passport.parameters.iter_mut().zip(stored) {
                    parameter.value = saved.value.unwrap_or_default();
                }
            }
            Err(e) => warn!(error = %e, "Ignoring corrupt passport snapshot"),
        }
        Ok(passport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::MemoryStore;

    #[test]
    fn test_fixed_table() {
        let passport = EnergyPassport::new();
        assert_eq!(passport.parameters().len(), 7);
        assert_eq!(passport.parameters()[3].definition.symbol, "ГСОП");
        assert_eq!(passport.value(7), Some(""));
        assert_eq!(passport.value(8), None);
    }

    #[test]
    fn test_set_value_and_round_trip() {
        let mut passport = EnergyPassport::new();
        passport.set_value(1, "-31").unwrap();
        passport.set_value(4, "5890").unwrap();
        assert!(matches!(passport.set_value(0, "x"), Err(EngineError::PassportParameterNotFound(0))));

        let mut store = MemoryStore::new();
        passport.save(&mut store).unwrap();
        let restored = EnergyPassport::restore(&store).unwrap();
        assert_eq!(restored, passport);
    }

    #[test]
    fn test_restore_tolerates_short_long_and_corrupt_snapshots() {
        let mut store = MemoryStore::new();
        store.set(PASSPORT_KEY, r#"[{"value":"-25"},{}]"#).unwrap();
        let short = EnergyPassport::restore(&store).unwrap();
        assert_eq!(short.value(1), Some("-25"));
        assert_eq!(short.value(2), Some(""));

        let long: Vec<String> = (0..9).map(|i| format!(r#"{{"value":"{i}"}}"#)).collect();
        store.set(PASSPORT_KEY, &format!("[{}]", long.join(","))).unwrap();
        let restored = EnergyPassport::restore(&store).unwrap();
        assert_eq!(restored.value(7), Some("6"));

        store.set(PASSPORT_KEY, "{broken").unwrap();
        assert_eq!(EnergyPassport::restore(&store).unwrap(), EnergyPassport::new());
    }
}
