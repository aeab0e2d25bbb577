use std::path::PathBuf;

/// One staged row, exactly as it appeared in the source file.
///
/// Every data field is loose text; `None` means the column was missing on
/// that line. Nothing here is validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Zero-based position in ingestion order, across all source files.
    pub row_id: u64,
    pub year: Option<String>,
    pub quarter: Option<String>,
    pub county: Option<String>,
    pub sales: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct RawTable {
    /// Files the rows were read from, in read order.
    pub sources: Vec<PathBuf>,
    /// Staged rows, ordered by `row_id`.
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row id the next appended record should carry.
    pub fn next_row_id(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Build a table from in-memory tuples, numbering rows in order.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, S, S, S)>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(i, (y, q, c, s))| RawRecord {
                row_id: i as u64,
                year: Some(y.into()),
                quarter: Some(q.into()),
                county: Some(c.into()),
                sales: Some(s.into()),
            })
            .collect();
        RawTable {
            sources: Vec::new(),
            rows,
        }
    }
}
