#![forbid(unsafe_code)]

pub mod inspect;

use std::path::{Path, PathBuf};

use calamine::{Data, Range, Reader as _};

use crate::error::ImportError;

/// A worksheet as a dense grid anchored at A1, so column indices match what
/// the user sees in the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sheet {
    pub name: String,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 0-based; missing cells read as `None`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Spreadsheet,
    Csv,
}

fn input_kind(path: &Path) -> Option<InputKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "xla" | "ods" => Some(InputKind::Spreadsheet),
        "csv" => Some(InputKind::Csv),
        _ => None,
    }
}

impl Workbook {
    /// Reads every sheet fully into memory.
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let kind =
            input_kind(path).ok_or_else(|| ImportError::UnsupportedInput(path.to_path_buf()))?;
        if !path.exists() {
            return Err(ImportError::IoPath {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
        let sheets = match kind {
            InputKind::Spreadsheet => read_spreadsheet(path)?,
            InputKind::Csv => vec![read_csv(path)?],
        };
        tracing::debug!(path = %path.display(), sheets = sheets.len(), "workbook loaded");
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        match self.path.file_name().and_then(|s| s.to_str()) {
            Some(name) => name.to_owned(),
            None => self.path.to_string_lossy().into_owned(),
        }
    }
}

fn read_spreadsheet(path: &Path) -> Result<Vec<Sheet>, ImportError> {
    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|source| ImportError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| ImportError::Sheet {
                sheet: name.clone(),
                msg: e.to_string(),
            })?;

        let rows = grid_from_range(&range);
        sheets.push(Sheet::new(name, rows));
    }
    Ok(sheets)
}

/// Anchors the used range at A1. Rows above and columns left of the range
/// become empty padding; trailing empty cells are dropped, so rows can be
/// ragged.
fn grid_from_range(range: &Range<Data>) -> Vec<Vec<String>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };
    let start_col = start_col as usize;

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for cells in range.rows() {
        let used = cells
            .iter()
            .rposition(|d| !matches!(d, Data::Empty))
            .map_or(0, |i| i + 1);
        let mut row = Vec::new();
        if used > 0 {
            row.reserve(start_col + used);
            row.resize(start_col, String::new());
            row.extend(cells[..used].iter().map(cell_text));
        }
        rows.push(row);
    }
    rows
}

fn cell_text(data: &Data) -> String {
    match data {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> Result<Sheet, ImportError> {
    let io_err = |source: std::io::Error| ImportError::IoPath {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| io_err(e.into()))?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| io_err(e.into()))?;
        rows.push(record.iter().map(str::to_owned).collect());
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_owned();
    Ok(Sheet::new(name, rows))
}
