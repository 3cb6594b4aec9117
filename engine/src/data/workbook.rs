// In-memory workbook model and the sheet builders for both datasets. The
// model is plain data so layouts can be tested without touching a file;
// `data::xlsx` renders it.
use std::collections::HashSet;

use energy_shared::models::{ConsumptionRow, ProductionGroup, ProductionItem, ReportMeta};
use tracing::warn;

use crate::metrics::consumption::{resource_trend, resource_years, structure_for_year, year_totals};
use crate::metrics::specific::specific_table;
use crate::metrics::{monetary_series, primary_series, sum_defined, year_over_year, YearDelta, YearlySeries};

pub const MAX_SHEET_NAME_CHARS: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    /// Plain number (years, counts).
    Number(f64),
    /// Year-column value, rendered with 2-decimal display formatting.
    Decimal(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Undefined values become blank cells.
    pub fn decimal(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => Cell::Decimal(v),
            _ => Cell::Empty,
        }
    }
}

/// A rectangular merged range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
    pub merges: Vec<Merge>,
    pub column_widths: Vec<f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            merges: Vec::new(),
            column_widths: Vec::new(),
        }
    }

    /// Appends a row and returns its index.
    pub fn push_row(&mut self, cells: Vec<Cell>) -> u32 {
        self.rows.push(cells);
        (self.rows.len() - 1) as u32
    }

    pub fn merge_down(&mut self, col: u16, first_row: u32, row_count: u32) {
        if row_count > 1 {
            self.merges.push(Merge {
                first_row,
                first_col: col,
                last_row: first_row + row_count - 1,
                last_col: col,
            });
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sheet under a valid, unique name and returns the name used.
    pub fn add_sheet(&mut self, mut sheet: Sheet) -> String {
        let taken: HashSet<String> = self.sheets.iter().map(|s| s.name.to_lowercase()).collect();
        let name = unique_sheet_name(&sheet.name, &taken);
        if name != sheet.name {
            warn!(requested = %sheet.name, used = %name, "Adjusted worksheet name");
        }
        sheet.name = name.clone();
        self.sheets.push(sheet);
        name
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Replaces characters a worksheet name may not carry and cuts it to the
/// 31-character limit.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if FORBIDDEN_SHEET_CHARS.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let cut: String = cleaned.chars().take(MAX_SHEET_NAME_CHARS).collect();
    let cut = cut.trim_end().to_string();
    if cut.is_empty() {
        "Лист".to_string()
    } else {
        cut
    }
}

fn unique_sheet_name(raw: &str, taken: &HashSet<String>) -> String {
    let base = sanitize_sheet_name(raw);
    if !taken.contains(&base.to_lowercase()) {
        return base;
    }
    (2..)
        .map(|n| {
            let suffix = format!(" ({n})");
            let room = MAX_SHEET_NAME_CHARS - suffix.chars().count();
            let stem: String = base.chars().take(room).collect();
            format!("{}{suffix}", stem.trim_end())
        })
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or(base)
}

fn year_header(meta: &ReportMeta, leading: &[&str]) -> Vec<Cell> {
    let mut header: Vec<Cell> = leading.iter().map(|s| Cell::text(*s)).collect();
    header.extend(meta.horizon().years().into_iter().map(|y| Cell::text(y.to_string())));
    header
}

fn labelled(leading: &[&str], values: impl IntoIterator<Item = Cell>) -> Vec<Cell> {
    leading.iter().map(|s| Cell::text(*s)).chain(values).collect()
}

fn delta_rows(sheet: &mut Sheet, first: Vec<Cell>, leading_blanks: usize, deltas: &[YearDelta]) {
    sheet.push_row(first.into_iter().chain(deltas.iter().map(|d| Cell::decimal(d.value))).collect());
    let pad = || (0..leading_blanks).map(|_| Cell::Empty);
    sheet.push_row(
        pad()
            .chain([Cell::text("Δ")])
            .chain(deltas.iter().map(|d| Cell::decimal(d.delta)))
            .collect(),
    );
    sheet.push_row(
        pad()
            .chain([Cell::text("Δ%")])
            .chain(deltas.iter().map(|d| Cell::decimal(d.percent)))
            .collect(),
    );
}

fn column_widths(leading: &[f64], years_count: usize) -> Vec<f64> {
    leading
        .iter()
        .copied()
        .chain(std::iter::repeat(14.0).take(years_count))
        .collect()
}

/// Main sheet: a five-row block per resource with the name merged down.
fn calculator_sheet(meta: &ReportMeta, rows: &[ConsumptionRow]) -> Sheet {
    let years_count = meta.horizon().years_count;
    let mut sheet = Sheet::new("Калькулятор");
    sheet.push_row(year_header(meta, &["Наименование энергоносителя", "Подпункт", "Единица измерения"]));

    for row in rows {
        let years = resource_years(row, years_count);
        let block = [
            (row.display_name.as_str(), "Потребление", row.unit.as_str()),
            ("", "Потребление", "т.у.т"),
            ("", "Затраты", "тенге"),
            ("", "Себестоимость", "тг/т.у.т"),
            ("", "", "тг/ед"),
        ];
        let start = sheet.rows.len() as u32;
        for (line, (name, label, unit)) in block.into_iter().enumerate() {
            let values = years.iter().map(|y| {
                Cell::decimal(match line {
                    0 => y.quantity,
                    1 => y.standard_fuel,
                    2 => y.money,
                    3 => y.cost_per_standard_fuel,
                    _ => y.unit_cost,
                })
            });
            sheet.push_row(labelled(&[name, label, unit], values));
        }
        sheet.merge_down(0, start, 5);
    }

    let totals = year_totals(rows, years_count);
    let start = sheet.push_row(labelled(
        &["ИТОГО", "", "т.у.т"],
        totals.iter().map(|t| Cell::Decimal(t.standard_fuel)),
    ));
    sheet.push_row(labelled(&["", "", "тенге"], totals.iter().map(|t| Cell::Decimal(t.money))));
    sheet.merge_down(0, start, 2);

    sheet.column_widths = column_widths(&[28.0, 16.0, 14.0], years_count);
    sheet
}

fn totals_sheet(meta: &ReportMeta, rows: &[ConsumptionRow]) -> Sheet {
    let years_count = meta.horizon().years_count;
    let totals = year_totals(rows, years_count);
    let fuel: Vec<f64> = totals.iter().map(|t| t.standard_fuel).collect();
    let money: Vec<f64> = totals.iter().map(|t| t.money).collect();

    let mut sheet = Sheet::new("Итоги по годам");
    sheet.push_row(
        std::iter::once(Cell::text("Год"))
            .chain(meta.horizon().years().into_iter().map(|y| Cell::Number(f64::from(y))))
            .collect(),
    );
    for (label, series) in [("т.у.т", &fuel), ("тенге", &money)] {
        let deltas = year_over_year(series);
        sheet.push_row(labelled(&[label], deltas.iter().map(|d| Cell::decimal(d.value))));
        sheet.push_row(labelled(&[format!("Δ {label}").as_str()], deltas.iter().map(|d| Cell::decimal(d.delta))));
        sheet.push_row(labelled(&[format!("Δ% {label}").as_str()], deltas.iter().map(|d| Cell::decimal(d.percent))));
    }
    sheet.column_widths = column_widths(&[14.0], years_count);
    sheet
}

fn per_resource_sheet(meta: &ReportMeta, rows: &[ConsumptionRow]) -> Sheet {
    let years_count = meta.horizon().years_count;
    let mut sheet = Sheet::new("По ресурсам");
    sheet.push_row(year_header(meta, &["Ресурс", "Показатель"]));

    for row in rows {
        let trend = resource_trend(row, years_count);
        let name = row.display_name.as_str();
        let quantity_label = format!("Потребление ({})", row.unit);
        let metrics = [
            (quantity_label.as_str(), &trend.quantity),
            ("т.у.т", &trend.standard_fuel),
            ("Деньги (₸)", &trend.money),
            ("Себестоимость (₸/ед)", &trend.unit_cost),
        ];
        for (label, deltas) in metrics {
            delta_rows(&mut sheet, labelled(&[name, label], []), 1, deltas);
        }
        sheet.push_row(Vec::new());
    }
    sheet.column_widths = column_widths(&[28.0, 24.0], years_count);
    sheet
}

fn structure_sheets(meta: &ReportMeta, rows: &[ConsumptionRow]) -> Vec<Sheet> {
    let mut sheets = Vec::new();
    for (index, year) in meta.horizon().years().into_iter().enumerate() {
        let slices = structure_for_year(rows, index);

        let mut money = Sheet::new(format!("Структура {year} (деньги)"));
        money.push_row(vec![Cell::text("Ресурс"), Cell::text("Деньги (₸)")]);
        let mut fuel = Sheet::new(format!("Структура {year} (тут)"));
        fuel.push_row(vec![Cell::text("Ресурс"), Cell::text("т.у.т")]);

        for slice in &slices {
            money.push_row(vec![Cell::text(slice.name.as_str()), Cell::Decimal(slice.money)]);
            fuel.push_row(vec![Cell::text(slice.name.as_str()), Cell::Decimal(slice.standard_fuel)]);
        }
        money.column_widths = vec![28.0, 16.0];
        fuel.column_widths = vec![28.0, 16.0];
        sheets.push(money);
        sheets.push(fuel);
    }
    sheets
}

pub fn consumption_workbook(meta: &ReportMeta, rows: &[ConsumptionRow]) -> Workbook {
    let mut workbook = Workbook::new();
    workbook.add_sheet(calculator_sheet(meta, rows));
    workbook.add_sheet(totals_sheet(meta, rows));
    workbook.add_sheet(per_resource_sheet(meta, rows));
    for sheet in structure_sheets(meta, rows) {
        workbook.add_sheet(sheet);
    }
    workbook
}

fn production_sheet(meta: &ReportMeta, groups: &[ProductionGroup]) -> Sheet {
    let years_count = meta.horizon().years_count;
    let mut sheet = Sheet::new("Продукция");
    sheet.push_row(year_header(meta, &["Группа", "Наименование", "Показатель", "Единица измерения"]));

    for group in groups {
        let group_start = sheet.rows.len() as u32;
        for (n, item) in group.items.iter().enumerate() {
            let group_cell = if n == 0 { group.name.as_str() } else { "" };
            let start = sheet.push_row(labelled(
                &[group_cell, item.name.as_str(), "Выпуск", item.unit_of_output.as_str()],
                primary_series(item, years_count).into_iter().map(Cell::decimal),
            ));
            sheet.push_row(labelled(
                &["", "", "Стоимость", "тенге"],
                monetary_series(item, years_count).into_iter().map(Cell::decimal),
            ));
            sheet.merge_down(1, start, 2);
        }
        sheet.merge_down(0, group_start, (group.items.len() * 2) as u32);
    }

    let totals = (0..years_count).map(|i| {
        Cell::Decimal(sum_defined(
            groups.iter().flat_map(|g| g.items.iter()).map(|item| item.monetary(i)),
        ))
    });
    sheet.push_row(labelled(&["ИТОГО", "", "Стоимость", "тенге"], totals));
    sheet.column_widths = column_widths(&[24.0, 28.0, 14.0, 16.0], years_count);
    sheet
}

fn item_detail_sheet(meta: &ReportMeta, item: &ProductionItem) -> Sheet {
    let years_count = meta.horizon().years_count;
    let mut sheet = Sheet::new(item_label(item));
    sheet.push_row(year_header(meta, &["Показатель"]));
    let output = year_over_year(&primary_series(item, years_count));
    let value = year_over_year(&monetary_series(item, years_count));
    delta_rows(&mut sheet, labelled(&[format!("Выпуск ({})", item.unit_of_output).as_str()], []), 0, &output);
    delta_rows(&mut sheet, labelled(&["Стоимость (₸)"], []), 0, &value);
    sheet.column_widths = column_widths(&[24.0], years_count);
    sheet
}

fn item_specific_sheet(meta: &ReportMeta, item: &ProductionItem, rows: &[ConsumptionRow]) -> Sheet {
    let years_count = meta.horizon().years_count;
    let table = specific_table(item, rows, years_count);
    let per_unit = |unit: &str| format!("{unit}/{}", item.unit_of_output);

    let mut sheet = Sheet::new(format!("Уд. {}", item_label(item)));
    sheet.push_row(year_header(meta, &["Ресурс", "Показатель", "Единица измерения"]));
    for line in &table.lines {
        let start = sheet.push_row(labelled(
            &[line.resource_name.as_str(), "Расход на ед.", per_unit(&line.resource_unit).as_str()],
            line.quantity.iter().map(|v| Cell::decimal(*v)),
        ));
        sheet.push_row(labelled(
            &["", "Затраты на ед.", per_unit("тенге").as_str()],
            line.cost.iter().map(|v| Cell::decimal(*v)),
        ));
        sheet.merge_down(0, start, 2);
    }
    let start = sheet.push_row(labelled(
        &["ИТОГО", "Расход на ед.", ""],
        table.total_quantity.iter().map(|v| Cell::decimal(*v)),
    ));
    sheet.push_row(labelled(
        &["", "Затраты на ед.", per_unit("тенге").as_str()],
        table.total_cost.iter().map(|v| Cell::decimal(*v)),
    ));
    sheet.merge_down(0, start, 2);
    sheet.column_widths = column_widths(&[28.0, 16.0, 18.0], years_count);
    sheet
}

fn item_label(item: &ProductionItem) -> String {
    if item.name.trim().is_empty() {
        "Продукция".to_string()
    } else {
        item.name.clone()
    }
}

/// Production workbook: the item table, then a detail sheet and a
/// specific-consumption sheet per item against every consumption row.
pub fn production_workbook(meta: &ReportMeta, groups: &[ProductionGroup], rows: &[ConsumptionRow]) -> Workbook {
    let mut workbook = Workbook::new();
    workbook.add_sheet(production_sheet(meta, groups));
    for item in groups.iter().flat_map(|g| g.items.iter()) {
        workbook.add_sheet(item_detail_sheet(meta, item));
        workbook.add_sheet(item_specific_sheet(meta, item, rows));
    }
    workbook
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::{item, row};

    fn meta(years_count: usize) -> ReportMeta {
        ReportMeta {
            start_year: 2022,
            years_count,
            title: "Отчёт".to_string(),
        }
    }

    #[test]
    fn test_sheet_names_are_sanitized_and_unique() {
        assert_eq!(sanitize_sheet_name("Цех [1]: печь/сушка"), "Цех _1__ печь_сушка");
        assert_eq!(sanitize_sheet_name("   "), "Лист");
        let long = "Очень длинное название продукции номер один";
        assert_eq!(sanitize_sheet_name(long).chars().count(), MAX_SHEET_NAME_CHARS);

        let mut workbook = Workbook::new();
        assert_eq!(workbook.add_sheet(Sheet::new(long)).chars().count(), 31);
        let second = workbook.add_sheet(Sheet::new(long));
        assert!(second.ends_with(" (2)"));
        assert_eq!(second.chars().count(), 31);
        assert_eq!(workbook.add_sheet(Sheet::new("итоги")), "итоги");
        assert_eq!(workbook.add_sheet(Sheet::new("ИТОГИ")), "ИТОГИ (2)");
    }

    #[test]
    fn test_calculator_sheet_blocks() {
        let rows = vec![
            row("Газ", 0.5, &[("200", "1000"), ("", "")]),
            row("Уголь", 1.0, &[("10", "50"), ("20", "80")]),
        ];
        let workbook = consumption_workbook(&meta(2), &rows);
        let sheet = workbook.sheet("Калькулятор").unwrap();

        // header + 2 blocks of 5 + 2 total rows
        assert_eq!(sheet.rows.len(), 13);
        assert_eq!(sheet.cell(0, 3), Some(&Cell::text("2022")));
        assert_eq!(sheet.cell(1, 0), Some(&Cell::text("Газ")));
        assert_eq!(sheet.cell(2, 3), Some(&Cell::Decimal(100.0)));
        assert_eq!(sheet.cell(4, 3), Some(&Cell::Decimal(10.0)));
        assert_eq!(sheet.cell(5, 2), Some(&Cell::text("тг/ед")));
        assert_eq!(sheet.cell(5, 3), Some(&Cell::Decimal(5.0)));
        assert_eq!(sheet.cell(5, 4), Some(&Cell::Empty));
        assert_eq!(sheet.cell(11, 0), Some(&Cell::text("ИТОГО")));
        assert_eq!(sheet.cell(11, 4), Some(&Cell::Decimal(20.0)));
        assert_eq!(sheet.cell(12, 3), Some(&Cell::Decimal(1050.0)));
        assert_eq!(
            sheet.merges,
            vec![
                Merge { first_row: 1, first_col: 0, last_row: 5, last_col: 0 },
                Merge { first_row: 6, first_col: 0, last_row: 10, last_col: 0 },
                Merge { first_row: 11, first_col: 0, last_row: 12, last_col: 0 },
            ]
        );
        assert_eq!(sheet.column_widths, vec![28.0, 16.0, 14.0, 14.0, 14.0]);
    }

    #[test]
    fn test_consumption_sheet_order() {
        let rows = vec![row("Газ", 0.5, &[("200", "1000")])];
        let workbook = consumption_workbook(&meta(2), &rows);
        assert_eq!(
            workbook.sheet_names(),
            vec![
                "Калькулятор",
                "Итоги по годам",
                "По ресурсам",
                "Структура 2022 (деньги)",
                "Структура 2022 (тут)",
                "Структура 2023 (деньги)",
                "Структура 2023 (тут)",
            ]
        );
        let structure = workbook.sheet("Структура 2023 (тут)").unwrap();
        assert_eq!(structure.cell(1, 1), Some(&Cell::Decimal(0.0)));
    }

    #[test]
    fn test_totals_and_resource_sheets_carry_deltas() {
        let rows = vec![row("Газ", 1.0, &[("100", "10"), ("150", "10")])];
        let workbook = consumption_workbook(&meta(2), &rows);

        let totals = workbook.sheet("Итоги по годам").unwrap();
        assert_eq!(totals.cell(0, 1), Some(&Cell::Number(2022.0)));
        assert_eq!(totals.cell(2, 0), Some(&Cell::text("Δ т.у.т")));
        assert_eq!(totals.cell(2, 1), Some(&Cell::Empty));
        assert_eq!(totals.cell(2, 2), Some(&Cell::Decimal(50.0)));
        assert_eq!(totals.cell(3, 2), Some(&Cell::Decimal(0.5)));
        assert_eq!(totals.cell(6, 2), Some(&Cell::Decimal(0.0)));

        let resources = workbook.sheet("По ресурсам").unwrap();
        // header + 4 metrics * 3 rows + separator
        assert_eq!(resources.rows.len(), 14);
        assert_eq!(resources.cell(1, 1), Some(&Cell::text("Потребление (ед)")));
        assert_eq!(resources.cell(2, 1), Some(&Cell::text("Δ")));
        assert_eq!(resources.cell(2, 3), Some(&Cell::Decimal(50.0)));
        assert!(resources.rows[13].is_empty());
    }

    #[test]
    fn test_production_workbook_has_sheets_per_item() {
        let mut cement = item("Цемент", &[("4", "100"), ("", "")]);
        cement.unit_of_output = "т".to_string();
        let groups = vec![ProductionGroup {
            id: "g".to_string(),
            name: "Цех".to_string(),
            items: vec![cement, item("Клинкер", &[("2", "10"), ("1", "5")])],
        }];
        let rows = vec![row("Газ", 1.0, &[("8", "20"), ("3", "3")])];
        let workbook = production_workbook(&meta(2), &groups, &rows);
        assert_eq!(
            workbook.sheet_names(),
            vec!["Продукция", "Цемент", "Уд. Цемент", "Клинкер", "Уд. Клинкер"]
        );

        let main = workbook.sheet("Продукция").unwrap();
        assert_eq!(main.rows.len(), 6);
        assert_eq!(main.cell(5, 4), Some(&Cell::Decimal(110.0)));
        assert!(main.merges.contains(&Merge { first_row: 1, first_col: 0, last_row: 4, last_col: 0 }));

        let specific = workbook.sheet("Уд. Цемент").unwrap();
        assert_eq!(specific.cell(1, 2), Some(&Cell::text("ед/т")));
        assert_eq!(specific.cell(1, 3), Some(&Cell::Decimal(2.0)));
        assert_eq!(specific.cell(2, 3), Some(&Cell::Decimal(5.0)));
        assert_eq!(specific.cell(1, 4), Some(&Cell::Empty));
        assert_eq!(specific.cell(3, 0), Some(&Cell::text("ИТОГО")));

        let detail = workbook.sheet("Клинкер").unwrap();
        assert_eq!(detail.cell(2, 2), Some(&Cell::Decimal(-1.0)));
        assert_eq!(detail.cell(3, 2), Some(&Cell::Decimal(-0.5)));
    }
}
