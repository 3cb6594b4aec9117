// Tabular serialization (CSV codec, workbook model and XLSX rendering) and
// the key-value snapshot store.
pub mod csv_codec;
pub mod store;
pub mod workbook;
pub mod xlsx;

pub fn consumption_csv_file_name(years_count: usize) -> String {
    format!("energy_calc_{years_count}y.csv")
}

pub fn consumption_xlsx_file_name(year: i32) -> String {
    format!("energy_calc_{year}.xlsx")
}

pub fn production_csv_file_name(year: i32) -> String {
    format!("production_{year}.csv")
}

pub fn production_xlsx_file_name(year: i32) -> String {
    format!("production_{year}.xlsx")
}
