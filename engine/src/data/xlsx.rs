// Renders the workbook model to an .xlsx file with rust_xlsxwriter.
use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook, Worksheet};
use tracing::info;

use super::workbook::{Cell, Sheet, Workbook};
use crate::error::EngineResult;

pub const DECIMAL_FORMAT: &str = "#,##0.00";

fn anchor_text(sheet: &Sheet, row: u32, col: u16) -> String {
    match sheet.cell(row as usize, col as usize) {
        Some(Cell::Text(text)) => text.clone(),
        Some(Cell::Number(v)) | Some(Cell::Decimal(v)) => v.to_string(),
        _ => String::new(),
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, decimal: &Format, merged: &Format) -> EngineResult<()> {
    worksheet.set_name(&sheet.name)?;

    let anchors: HashSet<(u32, u16)> = sheet
        .merges
        .iter()
        .map(|m| (m.first_row, m.first_col))
        .collect();

    for (r, cells) in sheet.rows.iter().enumerate() {
        let row = r as u32;
        for (c, cell) in cells.iter().enumerate() {
            let col = c as u16;
            if anchors.contains(&(row, col)) {
                continue;
            }
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row, col, *value)?;
                }
                Cell::Decimal(value) => {
                    worksheet.write_number_with_format(row, col, *value, decimal)?;
                }
            }
        }
    }

    for m in &sheet.merges {
        let text = anchor_text(sheet, m.first_row, m.first_col);
        worksheet.merge_range(m.first_row, m.first_col, m.last_row, m.last_col, &text, merged)?;
    }

    for (c, width) in sheet.column_widths.iter().enumerate() {
        worksheet.set_column_width(c as u16, *width)?;
    }
    Ok(())
}

fn render(model: &Workbook) -> EngineResult<XlsxWorkbook> {
    let decimal = Format::new().set_num_format(DECIMAL_FORMAT);
    let merged = Format::new().set_align(rust_xlsxwriter::FormatAlign::VerticalCenter);

    let mut workbook = XlsxWorkbook::new();
    for sheet in model.sheets() {
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, sheet, &decimal, &merged)?;
    }
    Ok(workbook)
}

pub fn save_workbook(model: &Workbook, path: impl AsRef<Path>) -> EngineResult<()> {
    let path = path.as_ref();
    let mut workbook = render(model)?;
    workbook.save(path)?;
    info!(path = %path.display(), sheets = model.sheets().len(), "Saved workbook");
    Ok(())
}

pub fn workbook_bytes(model: &Workbook) -> EngineResult<Vec<u8>> {
    let mut workbook = render(model)?;
    Ok(workbook.save_to_buffer()?)
}
