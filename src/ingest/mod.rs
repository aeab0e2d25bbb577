// src/ingest/mod.rs
pub mod raw_table;

pub use raw_table::{RawRecord, RawTable};

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use glob::glob;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column positions of the four required fields within one file's header.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    year: usize,
    quarter: usize,
    county: usize,
    sales: usize,
}

impl ColumnMap {
    /// Match header names (trimmed, ASCII case-insensitive); extra columns are ignored.
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
                .ok_or_else(|| {
                    anyhow!(
                        "{}: missing required column `{}` (found: {:?})",
                        path.display(),
                        name,
                        headers.iter().collect::<Vec<_>>()
                    )
                })
        };
        Ok(ColumnMap {
            year: find("year")?,
            quarter: find("quarter")?,
            county: find("county")?,
            sales: find("sales")?,
        })
    }
}

/// Load one CSV file into a fresh raw table. Values are kept verbatim.
pub fn load_raw_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let mut table = RawTable::default();
    append_csv(&mut table, path.as_ref())?;
    Ok(table)
}

/// Expand `pattern` (a glob or a plain path) and load every match in sorted
/// order into one raw table, continuing the row id sequence across files.
#[tracing::instrument(level = "info")]
pub fn load_raw_sources(pattern: &str) -> Result<RawTable> {
    let mut paths: Vec<PathBuf> = glob(pattern)
        .with_context(|| format!("invalid input pattern '{}'", pattern))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    if paths.is_empty() {
        return Err(anyhow!("no input files match '{}'", pattern));
    }
    paths.sort();

    let mut table = RawTable::default();
    for path in &paths {
        append_csv(&mut table, path)?;
    }
    info!(files = paths.len(), rows = table.len(), "staged raw records");
    Ok(table)
}

fn append_csv(table: &mut RawTable, path: &Path) -> Result<()> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // short rows stage as nulls, cleaning decides what to do
        .from_path(path)
        .with_context(|| format!("failed to open CSV {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let cols = ColumnMap::from_headers(&headers, path)?;

    let before = table.len();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        let field = |i: usize| record.get(i).map(str::to_string);
        let row_id = table.next_row_id();
        table.rows.push(RawRecord {
            row_id,
            year: field(cols.year),
            quarter: field(cols.quarter),
            county: field(cols.county),
            sales: field(cols.sales),
        });
    }
    table.sources.push(path.to_path_buf());
    debug!(path = %path.display(), rows = table.len() - before, "loaded file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_rows_verbatim_with_reordered_headers() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(
            &dir,
            "sales.csv",
            "County,Sales,Year,Quarter,Notes\n  denver ,100,2020,1,x\nEAGLE/PITKIN,abc,2020,2,y\n",
        );

        let table = load_raw_csv(&path)?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.sources, vec![path]);

        let first = &table.rows[0];
        assert_eq!(first.row_id, 0);
        assert_eq!(first.county.as_deref(), Some("  denver "));
        assert_eq!(first.year.as_deref(), Some("2020"));
        assert_eq!(first.quarter.as_deref(), Some("1"));
        assert_eq!(first.sales.as_deref(), Some("100"));

        // no validation at this stage
        assert_eq!(table.rows[1].sales.as_deref(), Some("abc"));
        Ok(())
    }

    #[test]
    fn short_rows_stage_missing_fields_as_none() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "short.csv", "year,quarter,county,sales\n2021,3\n");

        let table = load_raw_csv(&path)?;
        assert_eq!(table.rows[0].quarter.as_deref(), Some("3"));
        assert_eq!(table.rows[0].county, None);
        assert_eq!(table.rows[0].sales, None);
        Ok(())
    }

    #[test]
    fn missing_header_is_a_load_error() -> Result<()> {
        let dir = TempDir::new()?;
        let path = write(&dir, "bad.csv", "year,quarter,county\n2020,1,Denver\n");

        let err = load_raw_csv(&path).unwrap_err();
        assert!(err.to_string().contains("sales"), "{err}");
        Ok(())
    }

    #[test]
    fn glob_continues_row_ids_across_sorted_files() -> Result<()> {
        let dir = TempDir::new()?;
        write(&dir, "b.csv", "year,quarter,county,sales\n2021,1,Adams,5\n");
        write(&dir, "a.csv", "year,quarter,county,sales\n2020,1,Denver,1\n2020,2,Denver,2\n");

        let pattern = format!("{}/*.csv", dir.path().display());
        let table = load_raw_sources(&pattern)?;

        assert_eq!(table.sources.len(), 2);
        assert!(table.sources[0].ends_with("a.csv"));
        let ids: Vec<u64> = table.rows.iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(table.rows[2].county.as_deref(), Some("Adams"));
        Ok(())
    }

    #[test]
    fn no_matching_files_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let pattern = format!("{}/*.csv", dir.path().display());
        assert!(load_raw_sources(&pattern).is_err());
        Ok(())
    }
}
