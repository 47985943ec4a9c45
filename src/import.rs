// 📥 CSV import - load records from spreadsheet exports
//
// Each row is deserialized into its typed record, stamped with the owner,
// validated, and either kept or reported as skipped. A file is inserted in one
// transaction: it lands whole or not at all.

use crate::db::SqliteStore;
use crate::records::{Budget, Expense, Income, Investment, Record, RecordKind, SavingsGoal};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug)]
pub struct SkippedRow {
    /// 1-based line in the file, header included
    pub line: u64,
    pub reason: String,
}

#[derive(Debug)]
pub struct LoadedCsv<R> {
    pub records: Vec<R>,
    pub skipped: Vec<SkippedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub kind: RecordKind,
    pub inserted: usize,
    pub skipped: usize,
}

pub fn load_csv<R>(csv_path: &Path, user_id: &str) -> Result<LoadedCsv<R>>
where
    R: Record + DeserializeOwned,
{
    let mut rdr = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV file: {}", csv_path.display()))?;

    let mut records: Vec<R> = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_ids = HashSet::new();

    for result in rdr.deserialize::<R>() {
        match result {
            Ok(mut record) => {
                let line = line_of(records.len() + skipped.len());
                record.assign_identity(user_id);
                if let Err(e) = record.validate() {
                    skipped.push(SkippedRow { line, reason: e.to_string() });
                } else if !seen_ids.insert(record.id().to_string()) {
                    skipped.push(SkippedRow {
                        line,
                        reason: format!("duplicate id {} in file", record.id()),
                    });
                } else {
                    records.push(record);
                }
            }
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or_else(|| line_of(records.len() + skipped.len()));
                skipped.push(SkippedRow { line, reason: e.to_string() });
            }
        }
    }

    for row in &skipped {
        warn!(file = %csv_path.display(), line = row.line, reason = %row.reason, "skipping row");
    }

    Ok(LoadedCsv { records, skipped })
}

/// Data rows start on line 2
fn line_of(row_index: usize) -> u64 {
    row_index as u64 + 2
}

/// Load `csv_path` as `kind` and insert every valid row for `user_id`
///
/// Any insert failure (an id already in the store, say) rolls the whole file back.
pub fn import_file(store: &SqliteStore, kind: RecordKind, csv_path: &Path, user_id: &str) -> Result<ImportSummary> {
    let tx = store
        .connection()
        .unchecked_transaction()
        .context("Starting import transaction")?;

    let (inserted, skipped) = match kind {
        RecordKind::Income => insert_all(load_csv::<Income>(csv_path, user_id)?, |r| store.insert_income(r))?,
        RecordKind::Expense => insert_all(load_csv::<Expense>(csv_path, user_id)?, |r| store.insert_expense(r))?,
        RecordKind::Investment => {
            insert_all(load_csv::<Investment>(csv_path, user_id)?, |r| store.insert_investment(r))?
        }
        RecordKind::SavingsGoal => {
            insert_all(load_csv::<SavingsGoal>(csv_path, user_id)?, |r| store.insert_savings_goal(r))?
        }
        RecordKind::Budget => insert_all(load_csv::<Budget>(csv_path, user_id)?, |r| store.insert_budget(r))?,
    };

    tx.commit().context("Committing import")?;
    info!(kind = kind.as_str(), inserted, skipped, "import finished");
    Ok(ImportSummary { kind, inserted, skipped })
}

fn insert_all<R, F>(loaded: LoadedCsv<R>, mut insert: F) -> Result<(usize, usize)>
where
    F: FnMut(&R) -> Result<()>,
{
    for record in &loaded.records {
        insert(record)?;
    }
    Ok((loaded.records.len(), loaded.skipped.len()))
}

// ============================================================================
// TESTS
// ============================================================================
