use serde::{Deserialize, Deserializer, Serialize};

/// Lowest and highest number of years a reporting horizon may span.
pub const MIN_YEARS_COUNT: usize = 1;
pub const MAX_YEARS_COUNT: usize = 10;

/// Supported range of the first horizon year.
pub const MIN_START_YEAR: i32 = 1900;
pub const MAX_START_YEAR: i32 = 2200;

/// One entry of the static resource catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceDefinition {
    pub id: &'static str,
    pub display_name: &'static str,
    pub natural_unit: &'static str,
    /// Standard-fuel equivalent per natural unit. `0.0` marks the custom sentinel.
    pub coefficient: f64,
}

/// Raw per-year input of a consumption row, exactly as typed (dot-normalized).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionCell {
    #[serde(default, deserialize_with = "lenient_string")]
    pub quantity: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub monetary_cost: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionRow {
    pub id: String,
    pub resource_id: String,
    pub display_name: String,
    pub unit: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub coefficient: f64,
    #[serde(default)]
    pub yearly_data: Vec<ConsumptionCell>,
    #[serde(default)]
    pub note: String,
}

/// Raw per-year input of a production item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionCell {
    #[serde(default, deserialize_with = "lenient_string")]
    pub natural_output: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub monetary_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_of_output: String,
    #[serde(default)]
    pub yearly_data: Vec<ProductionCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionGroup {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub items: Vec<ProductionItem>,
}

/// The contiguous run of reporting years. Index `i` of every per-year array
/// always means `start_year + i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Horizon {
    pub start_year: i32,
    pub years_count: usize,
}

impl Horizon {
    /// Builds a horizon, clamping the start year and the year count into
    /// the supported ranges.
    pub fn new(start_year: i32, years_count: usize) -> Self {
        Self {
            start_year: clamp_start_year(start_year),
            years_count: clamp_years_count(years_count),
        }
    }

    pub fn years(&self) -> Vec<i32> {
        (0..self.years_count)
            .filter_map(|offset| self.year_at(offset))
            .collect()
    }

    pub fn year_at(&self, index: usize) -> Option<i32> {
        if index >= self.years_count {
            return None;
        }
        i32::try_from(index)
            .ok()
            .and_then(|offset| self.start_year.checked_add(offset))
    }
}

pub fn is_supported_start_year(start_year: i32) -> bool {
    (MIN_START_YEAR..=MAX_START_YEAR).contains(&start_year)
}

pub fn clamp_start_year(start_year: i32) -> i32 {
    start_year.clamp(MIN_START_YEAR, MAX_START_YEAR)
}

/// Out-of-range counts are clamped, never rejected.
pub fn clamp_years_count(years_count: usize) -> usize {
    years_count.clamp(MIN_YEARS_COUNT, MAX_YEARS_COUNT)
}

/// Persisted metadata record shared by the consumption and production modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub start_year: i32,
    pub years_count: usize,
    #[serde(default)]
    pub title: String,
}

impl ReportMeta {
    pub fn horizon(&self) -> Horizon {
        Horizon::new(self.start_year, self.years_count)
    }
}

// A stored coefficient may come back as `null` (serde_json writes NaN that way).
fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.unwrap_or(f64::NAN))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Text(String),
    Integer(i64),
    Float(f64),
    Missing(Option<()>),
}

// Cells are stored as typed text, but older snapshots may carry plain JSON
// numbers or nulls.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawCell::deserialize(deserializer)? {
        RawCell::Text(text) => text,
        RawCell::Integer(n) => n.to_string(),
        RawCell::Float(v) => v.to_string(),
        RawCell::Missing(_) => String::new(),
    })
}
