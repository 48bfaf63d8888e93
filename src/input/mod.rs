use std::path::Path;

use thiserror::Error;

pub mod table;

pub use table::load_table;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// Scalar cell as exposed by the parsing boundary: text, number or blank.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Blank,
}

impl CellValue {
    /// String form used for grouping and status keys. Integral numbers render
    /// without a trailing `.0` so numeric org codes group under the same key
    /// as their text form.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            CellValue::Blank => String::new(),
        }
    }
}

/// One named table of columns and cell rows, the unit the pipeline consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// A loaded source: the table plus the names of all tables the source
/// offered, kept for schema-error diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    pub table: SheetTable,
    pub available_tables: Vec<String>,
}

pub fn source_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for ext in [".gz", ".csv", ".tsv", ".txt"] {
        if let Some(stripped) = name.strip_suffix(ext) {
            name = stripped.to_string();
        }
    }
    name
}
