#![forbid(unsafe_code)]

use serde::{Serialize, Serializer};

use crate::sheet::{Sheet, Workbook};

/// Structure of one sheet: header row plus every data row keyed by header.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SheetOverview {
    #[serde(skip)]
    pub name: String,
    #[serde(skip)]
    pub rows: usize,
    #[serde(skip)]
    pub columns: usize,
    pub headers: Vec<Option<String>>,
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl SheetOverview {
    #[must_use]
    pub fn from_sheet(sheet: &Sheet) -> Self {
        let columns = sheet.column_count();
        let headers: Vec<Option<String>> = (0..columns)
            .map(|c| {
                sheet
                    .cell(0, c)
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(str::to_owned)
            })
            .collect();

        let data = (1..sheet.row_count())
            .map(|r| {
                let mut row = serde_json::Map::new();
                for (c, header) in headers.iter().enumerate() {
                    let Some(header) = header else {
                        continue;
                    };
                    let value = match sheet.cell(r, c) {
                        Some(v) if !v.is_empty() => serde_json::Value::String(v.to_owned()),
                        _ => serde_json::Value::Null,
                    };
                    row.insert(header.clone(), value);
                }
                row
            })
            .collect();

        Self {
            name: sheet.name.clone(),
            rows: sheet.row_count(),
            columns,
            headers,
            data,
        }
    }

    /// First `n` data rows, dropping empty values.
    #[must_use]
    pub fn sample(&self, n: usize) -> Vec<Vec<(&str, &str)>> {
        self.data
            .iter()
            .take(n)
            .map(|row| {
                row.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.as_str(), s)))
                    .collect()
            })
            .collect()
    }
}

#[must_use]
pub fn inspect(workbook: &Workbook) -> Vec<SheetOverview> {
    workbook.sheets.iter().map(SheetOverview::from_sheet).collect()
}

/// `{ "<sheet>": { "headers": [...], "data": [...] } }` in workbook order.
#[derive(Debug, Clone, Copy)]
pub struct SheetMap<'a>(pub &'a [SheetOverview]);

impl Serialize for SheetMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|o| (o.name.as_str(), o)))
    }
}

#[must_use]
pub fn to_json_map(overviews: &[SheetOverview]) -> SheetMap<'_> {
    SheetMap(overviews)
}
