// src/clean/mod.rs
pub mod coerce;
pub mod dedup;
pub mod normalize;
pub mod table;

pub use coerce::{clean_record, NullTokens};
pub use normalize::normalize_county;
pub use table::{CleanedRecord, CleanedTable};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::ingest::RawTable;

/// What to do with a raw row that fails coercion or the non-null check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRowPolicy {
    /// Fail the whole run on the first bad row.
    #[default]
    Abort,
    /// Drop the row and record a `Rejection`.
    Skip,
}

#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    pub on_invalid_row: InvalidRowPolicy,
    pub null_tokens: NullTokens,
}

/// A raw row dropped under `InvalidRowPolicy::Skip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub row_id: u64,
    pub reason: PipelineError,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub table: CleanedTable,
    pub rejections: Vec<Rejection>,
    pub duplicates_removed: usize,
}

/// Coerce, normalize, validate and deduplicate the raw table.
///
/// Pure in its inputs: the same raw table and options always give the same
/// outcome.
#[tracing::instrument(level = "info", skip_all, fields(raw_rows = raw.len()))]
pub fn clean(raw: &RawTable, opts: &CleanOptions) -> Result<CleanOutcome> {
    let mut rows = Vec::with_capacity(raw.len());
    let mut rejections = Vec::new();

    for record in &raw.rows {
        match clean_record(record, &opts.null_tokens) {
            Ok(rec) => rows.push((record.row_id, rec)),
            Err(err) => match opts.on_invalid_row {
                InvalidRowPolicy::Abort => return Err(err),
                InvalidRowPolicy::Skip => {
                    warn!(row_id = record.row_id, error = %err, "rejected row");
                    rejections.push(Rejection {
                        row_id: record.row_id,
                        reason: err,
                    });
                }
            },
        }
    }

    rows.sort_by_key(|(row_id, _)| *row_id);
    let (survivors, duplicates_removed) = dedup::dedup_first_wins(rows);
    let table = CleanedTable::new(survivors.into_iter().map(|(_, rec)| rec).collect())?;

    info!(
        cleaned_rows = table.len(),
        duplicates_removed,
        rejected_rows = rejections.len(),
        "cleaned raw records"
    );
    Ok(CleanOutcome {
        table,
        rejections,
        duplicates_removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn raw(rows: &[(&str, &str, &str, &str)]) -> RawTable {
        RawTable::from_rows(rows.iter().copied())
    }

    #[test]
    fn case_variants_collapse_only_when_all_fields_match() -> Result<()> {
        let input = raw(&[
            ("2020", "1", "Denver", "100"),
            ("2020", "1", "denver", "100"),
            ("2020", "1", "Boulder", "50"),
        ]);
        let out = clean(&input, &CleanOptions::default())?;
        assert_eq!(out.duplicates_removed, 1);
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.records()[0].county, "Denver");
        assert_eq!(out.table.records()[1].county, "Boulder");

        let input = raw(&[("2020", "1", "Denver", "100"), ("2020", "1", "denver", "90")]);
        let out = clean(&input, &CleanOptions::default())?;
        assert_eq!(out.duplicates_removed, 0);
        assert_eq!(out.table.len(), 2);
        Ok(())
    }

    #[test]
    fn cleaning_twice_gives_the_same_table() -> Result<()> {
        let input = raw(&[
            ("2021", "2", " eagle/pitkin", "12"),
            ("2021", "2", "EAGLE/PITKIN ", "12"),
            ("2020", "4", "Adams", "3"),
        ]);
        let opts = CleanOptions::default();
        let a = clean(&input, &opts)?;
        let b = clean(&input, &opts)?;
        assert_eq!(a.table, b.table);
        assert_eq!(a.table.records()[0].county, "Eagle & pitkin");
        Ok(())
    }

    #[test]
    fn cleaned_records_are_unique() -> Result<()> {
        let input = raw(&[
            ("2020", "1", "a", "1"),
            ("2020", "1", "A", "1"),
            ("2020", "2", "a", "1"),
            ("2020", "2", " a ", "1"),
            ("2021", "1", "a", "1"),
        ]);
        let out = clean(&input, &CleanOptions::default())?;
        let distinct: HashSet<_> = out.table.records().iter().collect();
        assert_eq!(distinct.len(), out.table.len());
        assert_eq!(out.table.len(), 3);
        Ok(())
    }

    #[test]
    fn abort_policy_fails_on_first_bad_row() {
        let input = raw(&[
            ("2020", "1", "Denver", "100"),
            ("20x0", "1", "Denver", "100"),
            ("2020", "1", "Adams", ""),
        ]);
        let err = clean(&input, &CleanOptions::default()).unwrap_err();
        assert_eq!(err.row_id(), Some(1));
        assert!(matches!(err, PipelineError::Coercion { field: "year", .. }));
    }

    #[test]
    fn skip_policy_records_rejections() -> Result<()> {
        let input = raw(&[
            ("2020", "1", "Denver", "100"),
            ("20x0", "1", "Denver", "100"),
            ("2020", "1", "Adams", ""),
        ]);
        let opts = CleanOptions {
            on_invalid_row: InvalidRowPolicy::Skip,
            ..CleanOptions::default()
        };
        let out = clean(&input, &opts)?;
        assert_eq!(out.table.len(), 1);
        let ids: Vec<u64> = out.rejections.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(matches!(
            out.rejections[1].reason,
            PipelineError::MissingField { field: "sales", .. }
        ));
        Ok(())
    }
}
