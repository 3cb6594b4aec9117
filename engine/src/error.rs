use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV parsing system error: {source}")]
    CsvSystem {
        #[from]
        source: csv::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Workbook write error: {source}")]
    Workbook {
        #[from]
        source: rust_xlsxwriter::XlsxError,
    },

    // Malformed import file; the message names the failure for the user.
    #[error("Import failed: {0}")]
    ImportFormat(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Resource row not found: {0}")]
    RowNotFound(String),

    #[error("Production item not found: {0}")]
    ItemNotFound(String),

    #[error("Production group not found: {0}")]
    GroupNotFound(String),

    #[error("Year index {index} is outside the {years_count}-year horizon")]
    YearOutOfRange { index: usize, years_count: usize },

    #[error("Row {0} references a catalog resource; only custom rows take user-defined name, unit or coefficient")]
    NotCustomResource(String),

    #[error("Energy passport has no parameter number {0}")]
    PassportParameterNotFound(usize),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
