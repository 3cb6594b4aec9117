// Delimited-text codec for the consumption and production datasets.
//
// Layout (semicolon-delimited, every cell quoted, CRLF):
//   "Название отчёта";"<title>"
//   "Начальный год";"<startYear>"
//   "Кол-во лет";"<yearsCount>"
//   "Код";"Наименование";"Ед.";"Коэф.";"Кол-во 2021";"Сумма 2021";...
//   "<resourceId>";"<name>";"<unit>";"<coef>";"<qty>";"<cost>";...
//   "ИТОГО";"";"";"";"";"<total cost>";...
// Decimals are written with a comma. The production file uses the same
// preamble with a "Группа" header and (output, value) pairs per year.
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use energy_shared::decimal::{clean_input, export_cell, format_decimal, usable_number};
use energy_shared::models::{
    clamp_years_count, is_supported_start_year, ConsumptionCell, ConsumptionRow, ProductionCell,
    ProductionGroup, ProductionItem, ReportMeta, MAX_START_YEAR, MIN_START_YEAR,
};
use tracing::{info, warn};

use crate::catalog;
use crate::error::{EngineError, EngineResult};
use crate::ledger::new_id;
use crate::metrics::{consumption, sum_defined, YearlySeries};

pub const TITLE_LABEL: &str = "Название отчёта";
pub const START_YEAR_LABEL: &str = "Начальный год";
pub const YEARS_COUNT_LABEL: &str = "Кол-во лет";
pub const CONSUMPTION_HEADER: &str = "Код";
pub const PRODUCTION_HEADER: &str = "Группа";
pub const TOTAL_LABEL: &str = "ИТОГО";

/// Metadata lines found in an imported file. Absent lines stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportedMeta {
    pub title: Option<String>,
    pub start_year: Option<i32>,
    pub years_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumptionImport {
    pub meta: ImportedMeta,
    /// The horizon length the record bodies were sliced with.
    pub years_count: usize,
    pub rows: Vec<ConsumptionRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductionImport {
    pub meta: ImportedMeta,
    pub years_count: usize,
    pub groups: Vec<ProductionGroup>,
}

type CsvWriter = csv::Writer<Vec<u8>>;

fn csv_writer() -> CsvWriter {
    WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .flexible(true)
        .from_writer(Vec::new())
}

fn finish(writer: CsvWriter) -> EngineResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| EngineError::from(e.into_error()))?;
    let text = String::from_utf8(bytes).map_err(anyhow::Error::from)?;
    Ok(text)
}

fn write_preamble(writer: &mut CsvWriter, meta: &ReportMeta) -> EngineResult<()> {
    writer.write_record([TITLE_LABEL, meta.title.as_str()])?;
    writer.write_record([START_YEAR_LABEL.to_string(), meta.start_year.to_string()])?;
    writer.write_record([YEARS_COUNT_LABEL.to_string(), meta.years_count.to_string()])?;
    Ok(())
}

fn year_columns(meta: &ReportMeta, first: &str, second: &str) -> Vec<String> {
    meta.horizon()
        .years()
        .into_iter()
        .flat_map(|y| [format!("{first} {y}"), format!("{second} {y}")])
        .collect()
}

pub fn export_consumption(meta: &ReportMeta, rows: &[ConsumptionRow]) -> EngineResult<String> {
    let years_count = meta.horizon().years_count;
    let mut writer = csv_writer();
    write_preamble(&mut writer, meta)?;

    let mut header: Vec<String> = ["Код", "Наименование", "Ед.", "Коэф."]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(year_columns(meta, "Кол-во", "Сумма"));
    writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.resource_id.clone(),
            row.display_name.clone(),
            row.unit.clone(),
            format_decimal(row.coefficient),
        ];
        for i in 0..years_count {
            let cell = row.yearly_data.get(i).cloned().unwrap_or_default();
            record.push(export_cell(&cell.quantity));
            record.push(export_cell(&cell.monetary_cost));
        }
        writer.write_record(&record)?;
    }

    let mut total = vec![TOTAL_LABEL.to_string(), String::new(), String::new(), String::new()];
    for i in 0..years_count {
        total.push(String::new());
        total.push(format_decimal(consumption::total_money(rows, i)));
    }
    writer.write_record(&total)?;

    info!(rows = rows.len(), years_count, "Exported consumption dataset to CSV");
    finish(writer)
}

pub fn export_production(meta: &ReportMeta, groups: &[ProductionGroup]) -> EngineResult<String> {
    let years_count = meta.horizon().years_count;
    let mut writer = csv_writer();
    write_preamble(&mut writer, meta)?;

    let mut header: Vec<String> = ["Группа", "Наименование", "Ед. выпуска"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(year_columns(meta, "Выпуск", "Стоимость"));
    writer.write_record(&header)?;

    let mut items = 0;
    for group in groups {
        for item in &group.items {
            let mut record = vec![group.name.clone(), item.name.clone(), item.unit_of_output.clone()];
            for i in 0..years_count {
                let cell = item.yearly_data.get(i).cloned().unwrap_or_default();
                record.push(export_cell(&cell.natural_output));
                record.push(export_cell(&cell.monetary_value));
            }
            writer.write_record(&record)?;
            items += 1;
        }
    }

    let mut total = vec![TOTAL_LABEL.to_string(), String::new(), String::new()];
    for i in 0..years_count {
        let value = sum_defined(
            groups
                .iter()
                .flat_map(|g| g.items.iter())
                .map(|item| item.monetary(i)),
        );
        total.push(String::new());
        total.push(format_decimal(value));
    }
    writer.write_record(&total)?;

    info!(groups = groups.len(), items, years_count, "Exported production dataset to CSV");
    finish(writer)
}

fn read_records(text: &str) -> EngineResult<Vec<StringRecord>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        records.push(record);
    }
    Ok(records)
}

fn first_field(record: &StringRecord) -> &str {
    record.get(0).unwrap_or("")
}

fn find_header(records: &[StringRecord], sentinel: &str) -> EngineResult<usize> {
    records
        .iter()
        .position(|r| first_field(r) == sentinel)
        .ok_or_else(|| EngineError::ImportFormat(format!("header row \"{sentinel}\" not found")))
}

fn meta_value<'a>(preamble: &'a [StringRecord], label: &str) -> Option<&'a str> {
    preamble
        .iter()
        .find(|r| first_field(r) == label)
        .map(|r| r.get(1).unwrap_or(""))
}

// Metadata must be fully parsed before any record body is sliced.
fn parse_meta(preamble: &[StringRecord]) -> EngineResult<ImportedMeta> {
    let title = meta_value(preamble, TITLE_LABEL).map(str::to_string);

    let start_year = meta_value(preamble, START_YEAR_LABEL)
        .map(|raw| {
            raw.parse::<i32>()
                .ok()
                .filter(|year| is_supported_start_year(*year))
                .ok_or_else(|| {
                    EngineError::ImportFormat(format!(
                        "\"{START_YEAR_LABEL}\" is not a year between {MIN_START_YEAR} and {MAX_START_YEAR}: '{raw}'"
                    ))
                })
        })
        .transpose()?;

    let years_count = meta_value(preamble, YEARS_COUNT_LABEL)
        .map(|raw| {
            raw.parse::<i64>()
                .map(|n| clamp_years_count(n.clamp(0, i64::from(u8::MAX)) as usize))
                .map_err(|_| {
                    EngineError::ImportFormat(format!("\"{YEARS_COUNT_LABEL}\" is not a number: '{raw}'"))
                })
        })
        .transpose()?;

    Ok(ImportedMeta {
        title,
        start_year,
        years_count,
    })
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

/// Parses a consumption file. `fallback_years_count` is used only when the
/// file carries no year-count line; imported rows always get fresh ids.
pub fn import_consumption(text: &str, fallback_years_count: usize) -> EngineResult<ConsumptionImport> {
    let records = read_records(text)?;
    let header = find_header(&records, CONSUMPTION_HEADER)?;
    let meta = parse_meta(&records[..header])?;
    let years_count = meta.years_count.unwrap_or(fallback_years_count);

    let mut rows = Vec::new();
    for (offset, record) in records[header + 1..].iter().enumerate() {
        if first_field(record) == TOTAL_LABEL {
            break;
        }
        if record.len() < 4 {
            warn!(record = header + offset + 2, fields = record.len(), "Skipping short CSV record");
            continue;
        }
        let code = field(record, 0);
        let known = catalog::find_resource(code);
        let fallback = known.unwrap_or_else(catalog::custom_resource);

        let name = field(record, 1);
        let unit = field(record, 2);
        let coefficient = usable_number(field(record, 3))
            .unwrap_or_else(|| known.map_or(0.0, |def| def.coefficient));

        let yearly_data = (0..years_count)
            .map(|i| ConsumptionCell {
                quantity: clean_input(field(record, 4 + i * 2)),
                monetary_cost: clean_input(field(record, 5 + i * 2)),
            })
            .collect();

        rows.push(ConsumptionRow {
            id: new_id(),
            resource_id: fallback.id.to_string(),
            display_name: if name.is_empty() { fallback.display_name.to_string() } else { name.to_string() },
            unit: if unit.is_empty() { fallback.natural_unit.to_string() } else { unit.to_string() },
            coefficient,
            yearly_data,
            note: String::new(),
        });
    }

    info!(rows = rows.len(), years_count, "Parsed consumption CSV");
    Ok(ConsumptionImport {
        meta,
        years_count,
        rows,
    })
}

/// Parses a production file, regrouping items by group name in order of
/// first appearance.
pub fn import_production(text: &str, fallback_years_count: usize) -> EngineResult<ProductionImport> {
    let records = read_records(text)?;
    let header = find_header(&records, PRODUCTION_HEADER)?;
    let meta = parse_meta(&records[..header])?;
    let years_count = meta.years_count.unwrap_or(fallback_years_count);

    let mut groups: Vec<ProductionGroup> = Vec::new();
    for (offset, record) in records[header + 1..].iter().enumerate() {
        if first_field(record) == TOTAL_LABEL {
            break;
        }
        if record.len() < 3 {
            warn!(record = header + offset + 2, fields = record.len(), "Skipping short CSV record");
            continue;
        }
        let item = ProductionItem {
            id: new_id(),
            name: field(record, 1).to_string(),
            unit_of_output: field(record, 2).to_string(),
            yearly_data: (0..years_count)
                .map(|i| ProductionCell {
                    natural_output: clean_input(field(record, 3 + i * 2)),
                    monetary_value: clean_input(field(record, 4 + i * 2)),
                })
                .collect(),
        };

        let group_name = field(record, 0);
        match groups.iter_mut().find(|g| g.name == group_name) {
            Some(group) => group.items.push(item),
            None => groups.push(ProductionGroup {
                id: new_id(),
                name: group_name.to_string(),
                items: vec![item],
            }),
        }
    }

    info!(groups = groups.len(), years_count, "Parsed production CSV");
    Ok(ProductionImport {
        meta,
        years_count,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(years_count: usize) -> ReportMeta {
        ReportMeta {
            start_year: 2021,
            years_count,
            title: "Завод \"Север\"".to_string(),
        }
    }

    fn row(resource_id: &str, cells: &[(&str, &str)]) -> ConsumptionRow {
        let def = catalog::resolve(resource_id);
        ConsumptionRow {
            id: new_id(),
            resource_id: def.id.to_string(),
            display_name: def.display_name.to_string(),
            unit: def.natural_unit.to_string(),
            coefficient: def.coefficient,
            yearly_data: cells
                .iter()
                .map(|(q, m)| ConsumptionCell {
                    quantity: q.to_string(),
                    monetary_cost: m.to_string(),
                })
                .collect(),
            note: String::new(),
        }
    }

    #[test]
    fn test_export_layout() {
        let rows = vec![row("heat", &[("12.5", "1000"), ("", "")])];
        let text = export_consumption(&meta(2), &rows).unwrap();
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "\"Название отчёта\";\"Завод \"\"Север\"\"\"");
        assert_eq!(lines[1], "\"Начальный год\";\"2021\"");
        assert_eq!(lines[2], "\"Кол-во лет\";\"2\"");
        assert_eq!(
            lines[3],
            "\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\";\"Кол-во 2021\";\"Сумма 2021\";\"Кол-во 2022\";\"Сумма 2022\""
        );
        assert_eq!(lines[4], "\"heat\";\"Теплоэнергия\";\"Гкал\";\"0,143\";\"12,5\";\"1000\";\"\";\"\"");
        assert_eq!(lines[5], "\"ИТОГО\";\"\";\"\";\"\";\"\";\"1000\";\"\";\"0\"");
    }

    #[test]
    fn test_round_trip_two_resources_three_years() {
        let rows = vec![
            row("electricity", &[("1000", "25000,5"), ("1100.25", "26000"), ("", "")]),
            row("diesel", &[("300", "90000"), ("abc", ""), ("310", "93000")]),
        ];
        let text = export_consumption(&meta(3), &rows).unwrap();
        // the importing session currently runs a 5-year horizon
        let imported = import_consumption(&text, 5).unwrap();

        assert_eq!(imported.years_count, 3);
        assert_eq!(imported.meta.years_count, Some(3));
        assert_eq!(imported.meta.start_year, Some(2021));
        assert_eq!(imported.meta.title.as_deref(), Some("Завод \"Север\""));
        assert_eq!(imported.rows.len(), 2);
        for (original, back) in rows.iter().zip(&imported.rows) {
            assert_ne!(original.id, back.id);
            assert_eq!(back.resource_id, original.resource_id);
            assert_eq!(back.unit, original.unit);
            assert_eq!(back.coefficient, original.coefficient);
            assert_eq!(back.yearly_data.len(), 3);
            for i in 0..3 {
                assert_eq!(back.primary(i), original.primary(i));
                assert_eq!(back.monetary(i), original.monetary(i));
            }
        }
        assert_eq!(imported.rows[0].yearly_data[1].quantity, "1100.25");
    }

    #[test]
    fn test_file_horizon_wins_over_session_horizon() {
        let text = "\"Кол-во лет\";\"1\"\r\n\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\";\"Кол-во 2020\";\"Сумма 2020\"\r\n\"heat\";\"\";\"\";\"0,143\";\"5\";\"50\";\"7\";\"70\"\r\n";
        let imported = import_consumption(text, 4).unwrap();
        assert_eq!(imported.rows[0].yearly_data.len(), 1);
        assert_eq!(imported.rows[0].yearly_data[0].quantity, "5");
    }

    #[test]
    fn test_missing_years_line_falls_back_to_session() {
        let text = "\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n\"heat\";\"\";\"\";\"\";\"5\";\"50\"\r\n";
        let imported = import_consumption(text, 3).unwrap();
        assert_eq!(imported.years_count, 3);
        assert_eq!(imported.rows[0].yearly_data.len(), 3);
        assert_eq!(imported.rows[0].yearly_data[2], ConsumptionCell::default());
        // blank name, unit and coefficient come from the catalog
        assert_eq!(imported.rows[0].display_name, "Теплоэнергия");
        assert_eq!(imported.rows[0].unit, "Гкал");
        assert_eq!(imported.rows[0].coefficient, 0.143);
    }

    #[test]
    fn test_unknown_code_becomes_custom() {
        let text = "\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n\"steam_x\";\"Пар\";\"т\";\"0,1\"\r\n\"mystery\";\"\";\"\";\"?\"\r\n";
        let imported = import_consumption(text, 1).unwrap();
        assert_eq!(imported.rows[0].resource_id, catalog::CUSTOM_RESOURCE_ID);
        assert_eq!(imported.rows[0].display_name, "Пар");
        assert_eq!(imported.rows[0].coefficient, 0.1);
        assert_eq!(imported.rows[1].display_name, "Свой ресурс…");
        assert_eq!(imported.rows[1].coefficient, 0.0);
    }

    #[test]
    fn test_stops_at_total_and_skips_short_records() {
        let text = "\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n\"heat\";\"x\"\r\n\"diesel\";\"\";\"\";\"\";\"1\";\"2\"\r\n\"ИТОГО\";\"\";\"\";\"\";\"\";\"2\"\r\n\"heat\";\"\";\"\";\"\";\"9\";\"9\"\r\n";
        let imported = import_consumption(text, 1).unwrap();
        assert_eq!(imported.rows.len(), 1);
        assert_eq!(imported.rows[0].resource_id, "diesel");
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let result = import_consumption("\"Название отчёта\";\"x\"\r\n\"a\";\"b\"\r\n", 5);
        let err = result.unwrap_err();
        assert!(matches!(err, EngineError::ImportFormat(_)));
        assert!(err.to_string().contains("\"Код\""));
    }

    #[test]
    fn test_unparseable_metadata_is_an_error() {
        let text = "\"Кол-во лет\";\"пять\"\r\n\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n";
        assert!(matches!(import_consumption(text, 5), Err(EngineError::ImportFormat(_))));

        let text = "\"Начальный год\";\"\"\r\n\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n";
        assert!(matches!(import_consumption(text, 5), Err(EngineError::ImportFormat(_))));
    }

    #[test]
    fn test_start_year_outside_supported_range_is_rejected() {
        let header = "\"Кол-во лет\";\"3\"\r\n\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n\"heat\";\"\";\"\";\"\"\r\n";
        for year in ["2147483647", "-40", "1899", "2201"] {
            let text = format!("\"Начальный год\";\"{year}\"\r\n{header}");
            let err = import_consumption(&text, 5).unwrap_err();
            assert!(matches!(err, EngineError::ImportFormat(_)), "{year}");
        }
        let text = format!("\"Начальный год\";\"2200\"\r\n{header}");
        assert_eq!(import_consumption(&text, 5).unwrap().meta.start_year, Some(2200));
    }

    #[test]
    fn test_declared_years_count_is_clamped() {
        let text = "\"Кол-во лет\";\"25\"\r\n\"Код\";\"Наименование\";\"Ед.\";\"Коэф.\"\r\n\"heat\";\"\";\"\";\"\"\r\n";
        let imported = import_consumption(text, 5).unwrap();
        assert_eq!(imported.years_count, 10);
        assert_eq!(imported.rows[0].yearly_data.len(), 10);
    }

    #[test]
    fn test_bom_and_unquoted_input() {
        let text = "\u{feff}Код;Наименование;Ед.;Коэф.\nheat;;;;3,5;10\n";
        let imported = import_consumption(text, 1).unwrap();
        assert_eq!(imported.rows[0].yearly_data[0].quantity, "3.5");
    }

    #[test]
    fn test_production_round_trip_regroups_items() {
        let cell = |o: &str, v: &str| ProductionCell {
            natural_output: o.to_string(),
            monetary_value: v.to_string(),
        };
        let groups = vec![
            ProductionGroup {
                id: new_id(),
                name: "Цех 1".to_string(),
                items: vec![
                    ProductionItem {
                        id: new_id(),
                        name: "Цемент".to_string(),
                        unit_of_output: "т".to_string(),
                        yearly_data: vec![cell("100.5", "5000"), cell("", "")],
                    },
                    ProductionItem {
                        id: new_id(),
                        name: "Клинкер".to_string(),
                        unit_of_output: "т".to_string(),
                        yearly_data: vec![cell("40", "1000"), cell("45", "1200")],
                    },
                ],
            },
            ProductionGroup {
                id: new_id(),
                name: "Цех 2".to_string(),
                items: vec![ProductionItem {
                    id: new_id(),
                    name: "Известь".to_string(),
                    unit_of_output: "т".to_string(),
                    yearly_data: vec![cell("7", "70"), cell("8", "80")],
                }],
            },
        ];
        let text = export_production(&meta(2), &groups).unwrap();
        assert!(text.contains("\"ИТОГО\";\"\";\"\";\"\";\"6070\";\"\";\"1280\""));

        let imported = import_production(&text, 6).unwrap();
        assert_eq!(imported.years_count, 2);
        assert_eq!(imported.groups.len(), 2);
        assert_eq!(imported.groups[0].name, "Цех 1");
        assert_eq!(imported.groups[0].items.len(), 2);
        assert_eq!(imported.groups[0].items[0].yearly_data[0].natural_output, "100.5");
        assert_eq!(imported.groups[1].items[0].name, "Известь");
        assert_ne!(imported.groups[0].id, groups[0].id);
    }
}
