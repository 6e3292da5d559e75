#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rand::Rng;
use time::Date;

use crate::config::Config;
use crate::core::classify::{Classification, Classifier};
use crate::core::ids::{Clock, IdGenerator};
use crate::core::record::{Frequency, TaskRecord, TaskType};
use crate::core::schedule::{self, DEFAULT_STAGGER_WINDOW};
use crate::sheet::Workbook;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub start_date: Date,
    pub stagger_window: u32,
    /// Restart the stagger window at the top of every sheet instead of
    /// counting across the whole run.
    pub stagger_per_sheet: bool,
    /// 0-based.
    pub description_column: usize,
    pub header_rows: usize,
}

impl ImportOptions {
    #[must_use]
    pub fn new(start_date: Date) -> Self {
        Self {
            start_date,
            stagger_window: DEFAULT_STAGGER_WINDOW,
            stagger_per_sheet: false,
            description_column: 0,
            header_rows: 1,
        }
    }

    #[must_use]
    pub fn from_config(cfg: &Config, start_date: Date) -> Self {
        Self {
            start_date,
            stagger_window: cfg.schedule.stagger_window,
            stagger_per_sheet: cfg.schedule.stagger_per_sheet,
            description_column: cfg.input.description_column.saturating_sub(1),
            header_rows: cfg.input.header_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: String,
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub start_date: Date,
    pub sheets: Vec<SheetSummary>,
    pub records: Vec<TaskRecord>,
    /// Parallel to `records`.
    pub classifications: Vec<Classification>,
}

impl ImportReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn by_frequency(&self) -> BTreeMap<Frequency, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.frequency).or_insert(0) += 1;
        }
        counts
    }

    #[must_use]
    pub fn by_task_type(&self) -> BTreeMap<TaskType, usize> {
        let mut counts = BTreeMap::new();
        for r in &self.records {
            *counts.entry(r.task_type).or_insert(0) += 1;
        }
        counts
    }
}

/// One pass over every sheet: classify, schedule and number each non-blank
/// description.
pub fn import_workbook<C: Clock, R: Rng>(
    workbook: &Workbook,
    classifier: &Classifier,
    opts: &ImportOptions,
    ids: &mut IdGenerator<C, R>,
) -> ImportReport {
    let mut sheets = Vec::with_capacity(workbook.sheets.len());
    let mut records = Vec::new();
    let mut classifications = Vec::new();

    for sheet in &workbook.sheets {
        tracing::info!(sheet = %sheet.name, rows = sheet.row_count(), "processing sheet");
        let mut imported = 0usize;
        let mut skipped = 0usize;

        for row in opts.header_rows..sheet.row_count() {
            let description = sheet.cell(row, opts.description_column).unwrap_or("");
            if description.trim().is_empty() {
                tracing::debug!(sheet = %sheet.name, row = row + 1, "skipping blank description");
                skipped += 1;
                continue;
            }

            let position = records.len();
            let slot = if opts.stagger_per_sheet {
                imported
            } else {
                position
            };
            let classification = classifier.classify(description);
            let due = schedule::due_date(
                opts.start_date,
                schedule::stagger_index(slot, opts.stagger_window),
                classification.frequency,
            );

            records.push(TaskRecord::imported(
                ids.next_id(position),
                description.to_owned(),
                classification.task_type,
                classification.frequency,
                due,
            ));
            classifications.push(classification);
            imported += 1;
        }

        tracing::info!(sheet = %sheet.name, imported, skipped, "sheet done");
        sheets.push(SheetSummary {
            name: sheet.name.clone(),
            imported,
            skipped,
        });
    }

    ImportReport {
        start_date: opts.start_date,
        sheets,
        records,
        classifications,
    }
}
