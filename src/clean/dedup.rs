use std::collections::HashMap;

use super::table::CleanedRecord;

/// Keep the first occurrence of every exact (year, quarter, county, sales)
/// key. Input must be in ascending row id order; output keeps that order.
///
/// Returns the survivors and the number of rows dropped.
pub fn dedup_first_wins(rows: Vec<(u64, CleanedRecord)>) -> (Vec<(u64, CleanedRecord)>, usize) {
    // partition by key, remember rank-1 row id per partition
    let mut first_by_key: HashMap<&CleanedRecord, u64> = HashMap::with_capacity(rows.len());
    for (row_id, rec) in &rows {
        first_by_key
            .entry(rec)
            .and_modify(|first| *first = (*first).min(*row_id))
            .or_insert(*row_id);
    }
    let keep: Vec<bool> = rows
        .iter()
        .map(|(row_id, rec)| first_by_key.get(rec) == Some(row_id))
        .collect();
    drop(first_by_key);

    let before = rows.len();
    let survivors: Vec<(u64, CleanedRecord)> = rows
        .into_iter()
        .zip(keep)
        .filter_map(|(row, keep)| keep.then_some(row))
        .collect();
    let removed = before - survivors.len();
    (survivors, removed)
}
