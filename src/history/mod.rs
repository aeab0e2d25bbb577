// src/history/mod.rs

use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use glob::glob;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::{
    fs::{self, File},
    path::PathBuf,
    sync::Arc,
};

use crate::store::tables::write_batch;

/// Outcome of one completed pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Input pattern as configured.
    pub input: String,
    /// Files actually read, joined with `;`.
    pub sources: String,
    pub raw_rows: u64,
    pub cleaned_rows: u64,
    pub duplicates_removed: u64,
    pub rejected_rows: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunRecord {
    fn schema() -> SchemaRef {
        let ts = || DataType::Timestamp(TimeUnit::Microsecond, None);
        Arc::new(Schema::new(vec![
            Field::new("input", DataType::Utf8, false),
            Field::new("sources", DataType::Utf8, false),
            Field::new("raw_rows", DataType::UInt64, false),
            Field::new("cleaned_rows", DataType::UInt64, false),
            Field::new("duplicates_removed", DataType::UInt64, false),
            Field::new("rejected_rows", DataType::UInt64, false),
            Field::new("started_at", ts(), false),
            Field::new("finished_at", ts(), false),
        ]))
    }

    fn to_arrays(&self) -> Vec<ArrayRef> {
        vec![
            Arc::new(StringArray::from(vec![self.input.clone()])),
            Arc::new(StringArray::from(vec![self.sources.clone()])),
            Arc::new(UInt64Array::from(vec![self.raw_rows])),
            Arc::new(UInt64Array::from(vec![self.cleaned_rows])),
            Arc::new(UInt64Array::from(vec![self.duplicates_removed])),
            Arc::new(UInt64Array::from(vec![self.rejected_rows])),
            Arc::new(TimestampMicrosecondArray::from(vec![self
                .started_at
                .timestamp_micros()])),
            Arc::new(TimestampMicrosecondArray::from(vec![self
                .finished_at
                .timestamp_micros()])),
        ]
    }

    fn from_batch(batch: &RecordBatch, row: usize) -> Result<Self> {
        fn col<'a, T: 'static>(batch: &'a RecordBatch, idx: usize) -> Result<&'a T> {
            batch
                .column(idx)
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| anyhow!("history column {} has an unexpected type", idx))
        }
        let micros = |idx: usize| -> Result<DateTime<Utc>> {
            let v = col::<TimestampMicrosecondArray>(batch, idx)?.value(row);
            DateTime::from_timestamp_micros(v).ok_or_else(|| anyhow!("timestamp out of range: {}", v))
        };
        Ok(RunRecord {
            input: col::<StringArray>(batch, 0)?.value(row).to_string(),
            sources: col::<StringArray>(batch, 1)?.value(row).to_string(),
            raw_rows: col::<UInt64Array>(batch, 2)?.value(row),
            cleaned_rows: col::<UInt64Array>(batch, 3)?.value(row),
            duplicates_removed: col::<UInt64Array>(batch, 4)?.value(row),
            rejected_rows: col::<UInt64Array>(batch, 5)?.value(row),
            started_at: micros(6)?,
            finished_at: micros(7)?,
        })
    }
}

/// A run log backed by single-row Parquet files, one per run.
pub struct RunHistory {
    history_dir: PathBuf,
}

impl RunHistory {
    /// Open the history store at `history_dir`, creating the directory if needed.
    pub fn new(history_dir: impl Into<PathBuf>) -> Result<Self> {
        let history_dir = history_dir.into();
        fs::create_dir_all(&history_dir)
            .with_context(|| format!("creating history directory {:?}", &history_dir))?;
        Ok(Self { history_dir })
    }

    /// Writes `run_<finished_at micros>.parquet` and returns its path.
    pub fn record(&self, run: &RunRecord) -> Result<PathBuf> {
        let path = self
            .history_dir
            .join(format!("run_{}.parquet", run.finished_at.timestamp_micros()));
        let batch = RecordBatch::try_new(RunRecord::schema(), run.to_arrays())
            .context("building history record batch")?;
        write_batch(&path, &batch)?;
        Ok(path)
    }

    /// All recorded runs, oldest first.
    pub fn load_runs(&self) -> Result<Vec<RunRecord>> {
        let pattern = format!("{}/run_*.parquet", self.history_dir.display());
        let mut runs = Vec::new();
        for entry in glob(&pattern)? {
            let path = entry?;
            let file =
                File::open(&path).with_context(|| format!("failed to open `{}`", path.display()))?;
            let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
            for batch in reader {
                let batch = batch?;
                for row in 0..batch.num_rows() {
                    runs.push(RunRecord::from_batch(&batch, row)?);
                }
            }
        }
        runs.sort_by_key(|r| r.finished_at);
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn run(finished_secs: i64) -> RunRecord {
        RunRecord {
            input: "data/*.csv".into(),
            sources: "data/a.csv;data/b.csv".into(),
            raw_rows: 10,
            cleaned_rows: 8,
            duplicates_removed: 1,
            rejected_rows: 1,
            started_at: Utc.timestamp_opt(finished_secs - 2, 0).unwrap(),
            finished_at: Utc.timestamp_opt(finished_secs, 0).unwrap(),
        }
    }

    #[test]
    fn records_round_trip_in_finish_order() -> Result<()> {
        let dir = TempDir::new()?;
        let history = RunHistory::new(dir.path().join("history"))?;

        let later = run(1_700_000_100);
        let earlier = run(1_700_000_000);
        history.record(&later)?;
        history.record(&earlier)?;

        let runs = history.load_runs()?;
        assert_eq!(runs, vec![earlier, later]);
        Ok(())
    }

    #[test]
    fn empty_history_loads_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let history = RunHistory::new(dir.path())?;
        assert!(history.load_runs()?.is_empty());
        Ok(())
    }
}
