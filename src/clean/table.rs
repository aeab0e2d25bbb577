use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::{PipelineError, Result};

/// A validated, normalized row. Field order is the dedupe key order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub year: i32,
    pub quarter: i32,
    pub county: String,
    pub sales: i64,
}

/// The cleaned set, written once and then only read.
///
/// Records keep original ingestion order. `by_year` and `by_county` map a key
/// to positions in `records`, in ascending position order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    records: Vec<CleanedRecord>,
    by_year: BTreeMap<i32, Vec<usize>>,
    by_county: BTreeMap<String, Vec<usize>>,
}

impl CleanedTable {
    /// Build the table and its indexes, rejecting any exact duplicate.
    pub fn new(records: Vec<CleanedRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for (pos, rec) in records.iter().enumerate() {
            if !seen.insert(rec) {
                return Err(PipelineError::DuplicateRecord(pos));
            }
        }

        let mut by_year: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
        let mut by_county: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (pos, rec) in records.iter().enumerate() {
            by_year.entry(rec.year).or_default().push(pos);
            by_county.entry(rec.county.clone()).or_default().push(pos);
        }

        Ok(CleanedTable {
            records,
            by_year,
            by_county,
        })
    }

    pub fn records(&self) -> &[CleanedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.by_year.keys().copied()
    }

    /// Distinct counties, ascending.
    pub fn counties(&self) -> impl Iterator<Item = &str> + '_ {
        self.by_county.keys().map(String::as_str)
    }

    pub fn county_count(&self) -> usize {
        self.by_county.len()
    }

    pub fn for_year(&self, year: i32) -> impl Iterator<Item = &CleanedRecord> + '_ {
        self.lookup(self.by_year.get(&year))
    }

    pub fn for_county<'a>(&'a self, county: &str) -> impl Iterator<Item = &'a CleanedRecord> + 'a {
        self.lookup(self.by_county.get(county))
    }

    fn lookup<'a>(
        &'a self,
        positions: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a CleanedRecord> + 'a {
        positions
            .into_iter()
            .flatten()
            .map(move |&pos| &self.records[pos])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, quarter: i32, county: &str, sales: i64) -> CleanedRecord {
        CleanedRecord {
            year,
            quarter,
            county: county.into(),
            sales,
        }
    }

    #[test]
    fn indexes_group_positions_by_key() -> Result<()> {
        let table = CleanedTable::new(vec![
            rec(2021, 1, "Denver", 10),
            rec(2020, 1, "Adams", 5),
            rec(2020, 2, "Denver", 7),
        ])?;

        assert_eq!(table.years().collect::<Vec<_>>(), vec![2020, 2021]);
        assert_eq!(table.counties().collect::<Vec<_>>(), vec!["Adams", "Denver"]);
        assert_eq!(table.county_count(), 2);

        let denver: Vec<i64> = table.for_county("Denver").map(|r| r.sales).collect();
        assert_eq!(denver, vec![10, 7]);
        let y2020: Vec<&str> = table.for_year(2020).map(|r| r.county.as_str()).collect();
        assert_eq!(y2020, vec!["Adams", "Denver"]);
        assert_eq!(table.for_year(1999).count(), 0);
        Ok(())
    }

    #[test]
    fn rejects_exact_duplicates() {
        let err = CleanedTable::new(vec![rec(2020, 1, "Denver", 1), rec(2020, 1, "Denver", 1)])
            .unwrap_err();
        assert_eq!(err, PipelineError::DuplicateRecord(1));
    }
}
