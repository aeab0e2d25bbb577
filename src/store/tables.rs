use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, Int32Array, Int64Array, StringArray, UInt64Array},
    datatypes::{DataType, Field, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::clean::{CleanedRecord, CleanedTable};
use crate::ingest::{RawRecord, RawTable};

/// Staging layout: everything nullable text, plus the ingestion row id.
pub fn raw_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("row_id", DataType::UInt64, false),
        Field::new("year", DataType::Utf8, true),
        Field::new("quarter", DataType::Utf8, true),
        Field::new("county", DataType::Utf8, true),
        Field::new("sales", DataType::Utf8, true),
    ]))
}

/// Cleaned layout: typed and required.
pub fn cleaned_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("year", DataType::Int32, false),
        Field::new("quarter", DataType::Int32, false),
        Field::new("county", DataType::Utf8, false),
        Field::new("sales", DataType::Int64, false),
    ]))
}

fn text_column(raw: &RawTable, field: impl Fn(&RawRecord) -> Option<String>) -> ArrayRef {
    Arc::new(StringArray::from(
        raw.rows.iter().map(field).collect::<Vec<Option<String>>>(),
    ))
}

pub fn raw_to_batch(raw: &RawTable) -> Result<RecordBatch> {
    let columns: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(
            raw.rows.iter().map(|r| r.row_id).collect::<Vec<u64>>(),
        )),
        text_column(raw, |r| r.year.clone()),
        text_column(raw, |r| r.quarter.clone()),
        text_column(raw, |r| r.county.clone()),
        text_column(raw, |r| r.sales.clone()),
    ];
    RecordBatch::try_new(raw_schema(), columns).context("building raw record batch")
}

pub fn cleaned_to_batch(table: &CleanedTable) -> Result<RecordBatch> {
    let recs = table.records();
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int32Array::from(recs.iter().map(|r| r.year).collect::<Vec<i32>>())),
        Arc::new(Int32Array::from(recs.iter().map(|r| r.quarter).collect::<Vec<i32>>())),
        Arc::new(StringArray::from(
            recs.iter().map(|r| r.county.as_str()).collect::<Vec<&str>>(),
        )),
        Arc::new(Int64Array::from(recs.iter().map(|r| r.sales).collect::<Vec<i64>>())),
    ];
    RecordBatch::try_new(cleaned_schema(), columns).context("building cleaned record batch")
}

/// Write one batch to `path` via a temp file, then rename into place.
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("parquet.tmp");
    let file = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing record batch")?;
    writer.close().context("closing Arrow writer")?;
    fs::rename(&tmp, path)
        .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;
    debug!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(())
}

pub fn write_raw_table(path: &Path, raw: &RawTable) -> Result<()> {
    write_batch(path, &raw_to_batch(raw)?)
}

pub fn write_cleaned_table(path: &Path, table: &CleanedTable) -> Result<()> {
    write_batch(path, &cleaned_to_batch(table)?)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow!("cleaned table has no `{}` column", name))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow!("cleaned table column `{}` has an unexpected type", name))
}

/// Read a persisted cleaned table back, re-checking uniqueness and
/// rebuilding the indexes.
pub fn read_cleaned_table(path: &Path) -> Result<CleanedTable> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(8192)
        .build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.context("reading cleaned batch")?;
        let year = column::<Int32Array>(&batch, "year")?;
        let quarter = column::<Int32Array>(&batch, "quarter")?;
        let county = column::<StringArray>(&batch, "county")?;
        let sales = column::<Int64Array>(&batch, "sales")?;
        for i in 0..batch.num_rows() {
            if year.is_null(i) || quarter.is_null(i) || county.is_null(i) || sales.is_null(i) {
                return Err(anyhow!("{}: null value in row {}", path.display(), records.len()));
            }
            records.push(CleanedRecord {
                year: year.value(i),
                quarter: quarter.value(i),
                county: county.value(i).to_string(),
                sales: sales.value(i),
            });
        }
    }
    CleanedTable::new(records).with_context(|| format!("loading {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn cleaned_table_survives_a_round_trip() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("cleaned.parquet");
        let table = CleanedTable::new(vec![
            CleanedRecord {
                year: 2021,
                quarter: 3,
                county: "Eagle & pitkin".into(),
                sales: 12,
            },
            CleanedRecord {
                year: 2020,
                quarter: 1,
                county: "Denver".into(),
                sales: 100,
            },
        ])?;

        write_cleaned_table(&path, &table)?;
        assert!(!path.with_extension("parquet.tmp").exists());
        let back = read_cleaned_table(&path)?;
        assert_eq!(back, table);
        Ok(())
    }

    #[test]
    fn raw_batch_keeps_nulls_and_text() -> Result<()> {
        let mut raw = RawTable::from_rows([("2020", "1", " denver", "x")]);
        raw.rows[0].sales = None;
        let batch = raw_to_batch(&raw)?;
        assert_eq!(batch.num_rows(), 1);
        let county = batch
            .column_by_name("county")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(county.value(0), " denver");
        assert!(batch.column_by_name("sales").unwrap().is_null(0));

        let dir = TempDir::new()?;
        write_raw_table(&dir.path().join("raw.parquet"), &raw)?;
        assert!(dir.path().join("raw.parquet").exists());
        Ok(())
    }
}
