use std::str::FromStr;

use crate::clean::normalize::{clean_str, normalize_county};
use crate::error::{PipelineError, Result};
use crate::ingest::RawRecord;

use super::table::CleanedRecord;

/// Text values treated as null, compared after trimming and quote stripping.
#[derive(Debug, Clone)]
pub struct NullTokens(Vec<String>);

impl NullTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NullTokens(tokens.into_iter().map(Into::into).collect())
    }

    /// The empty string is always null, whatever the configured tokens.
    pub fn is_null(&self, cleaned: &str) -> bool {
        cleaned.is_empty() || self.0.iter().any(|t| t == cleaned)
    }
}

impl Default for NullTokens {
    fn default() -> Self {
        NullTokens::new(["", "NULL", "null", "N/A"])
    }
}

/// Coerce one loose field to an integer. `Ok(None)` means the field is null.
fn coerce_int<T: FromStr>(
    row_id: u64,
    field: &'static str,
    raw: Option<&str>,
    nulls: &NullTokens,
) -> Result<Option<T>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let cleaned = clean_str(raw);
    if nulls.is_null(cleaned) {
        return Ok(None);
    }
    cleaned
        .parse::<T>()
        .map(Some)
        .map_err(|_| PipelineError::Coercion {
            row_id,
            field,
            value: raw.to_string(),
        })
}

fn require<T>(row_id: u64, field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or(PipelineError::MissingField { row_id, field })
}

/// Parse and validate one raw row into a strongly-typed record.
///
/// Coercion failures are reported before null checks, field by field in
/// column order.
pub fn clean_record(raw: &RawRecord, nulls: &NullTokens) -> Result<CleanedRecord> {
    let id = raw.row_id;
    let year = coerce_int::<i32>(id, "year", raw.year.as_deref(), nulls)?;
    let quarter = coerce_int::<i32>(id, "quarter", raw.quarter.as_deref(), nulls)?;
    let sales = coerce_int::<i64>(id, "sales", raw.sales.as_deref(), nulls)?;
    let county = raw
        .county
        .as_deref()
        .map(clean_str)
        .filter(|c| !nulls.is_null(c))
        .map(normalize_county)
        .filter(|c| !c.is_empty());

    Ok(CleanedRecord {
        year: require(id, "year", year)?,
        quarter: require(id, "quarter", quarter)?,
        county: require(id, "county", county)?,
        sales: require(id, "sales", sales)?,
    })
}
