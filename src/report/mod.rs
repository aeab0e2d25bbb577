// src/report/mod.rs
//! Read-only aggregates over a `CleanedTable`. Every function here is a pure
//! read; nothing is cached between calls.
pub mod views;

pub use views::{View, ViewRows};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::clean::CleanedTable;
use crate::error::{PipelineError, Result};

/// Number of counties in the fixed top and bottom reports.
pub const RANKED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub row_count: usize,
    pub county_count: usize,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub total_sales: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub total_sales: i128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearOverYear {
    pub year: i32,
    pub total_sales: i128,
    pub prev_total: Option<i128>,
    /// `None` for the first year, and when the previous total is zero.
    pub pct_change: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterTotal {
    pub quarter: i32,
    pub total_sales: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyTotal {
    pub county: String,
    pub total_sales: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotal {
    pub year: i32,
    pub quarter: i32,
    pub total_sales: i128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyShare {
    pub county: String,
    pub total_sales: i128,
    /// `None` when the state total is zero.
    pub share_pct: Option<f64>,
}

/// `num / den * 100`, rounded half away from zero to two decimals.
///
/// Computed on integers so decimal ties such as 1.005 round up; `None` when
/// `den` is zero.
pub fn percent_2dp(num: i128, den: i128) -> Option<f64> {
    if den == 0 {
        return None;
    }
    let negative = (num < 0) != (den < 0);
    let (n, d) = (num.unsigned_abs() * 10_000, den.unsigned_abs());
    let hundredths = (2 * n + d) / (2 * d);
    let value = hundredths as f64 / 100.0;
    Some(if negative && hundredths != 0 { -value } else { value })
}

pub fn summary_stats(table: &CleanedTable) -> SummaryStats {
    SummaryStats {
        row_count: table.len(),
        county_count: table.county_count(),
        min_year: table.years().next(),
        max_year: table.years().last(),
        total_sales: state_total(table),
    }
}

/// Totals accumulate in `i128`, wide enough for any count of `i64` rows.
pub fn state_total(table: &CleanedTable) -> i128 {
    table.records().iter().map(|r| i128::from(r.sales)).sum()
}

/// Sum of sales per year, ascending by year.
pub fn yearly_totals(table: &CleanedTable) -> Vec<YearTotal> {
    table
        .years()
        .map(|year| YearTotal {
            year,
            total_sales: table.for_year(year).map(|r| i128::from(r.sales)).sum(),
        })
        .collect()
}

/// Percentage change of each yearly total against the preceding row of
/// `yearly_totals`.
pub fn year_over_year(table: &CleanedTable) -> Vec<YearOverYear> {
    let totals = yearly_totals(table);
    let mut prev: Option<i128> = None;
    totals
        .into_iter()
        .map(|yt| {
            let pct_change = prev.and_then(|p| percent_2dp(yt.total_sales - p, p));
            let row = YearOverYear {
                year: yt.year,
                total_sales: yt.total_sales,
                prev_total: prev,
                pct_change,
            };
            prev = Some(yt.total_sales);
            row
        })
        .collect()
}

/// Sum of sales per quarter across all years, ascending by quarter.
pub fn quarterly_totals(table: &CleanedTable) -> Vec<QuarterTotal> {
    let mut sums: BTreeMap<i32, i128> = BTreeMap::new();
    for r in table.records() {
        *sums.entry(r.quarter).or_default() += i128::from(r.sales);
    }
    sums.into_iter()
        .map(|(quarter, total_sales)| QuarterTotal {
            quarter,
            total_sales,
        })
        .collect()
}

/// Sum of sales per county, by total descending then county name ascending.
pub fn county_totals(table: &CleanedTable) -> Vec<CountyTotal> {
    let mut totals: Vec<CountyTotal> = table
        .counties()
        .map(|county| CountyTotal {
            county: county.to_string(),
            total_sales: table.for_county(county).map(|r| i128::from(r.sales)).sum(),
        })
        .collect();
    totals.sort_by(|a, b| {
        b.total_sales
            .cmp(&a.total_sales)
            .then_with(|| a.county.cmp(&b.county))
    });
    totals
}

pub fn top_counties(table: &CleanedTable) -> Vec<CountyTotal> {
    county_totals(table).into_iter().take(RANKED_LIMIT).collect()
}

/// Lowest totals first, ties by county name ascending.
pub fn bottom_counties(table: &CleanedTable) -> Vec<CountyTotal> {
    let mut totals = county_totals(table);
    totals.sort_by(|a, b| {
        a.total_sales
            .cmp(&b.total_sales)
            .then_with(|| a.county.cmp(&b.county))
    });
    totals.truncate(RANKED_LIMIT);
    totals
}

/// Sum of sales per (year, quarter), ascending.
pub fn timeline(table: &CleanedTable) -> Vec<PeriodTotal> {
    let mut sums: BTreeMap<(i32, i32), i128> = BTreeMap::new();
    for r in table.records() {
        *sums.entry((r.year, r.quarter)).or_default() += i128::from(r.sales);
    }
    sums.into_iter()
        .map(|((year, quarter), total_sales)| PeriodTotal {
            year,
            quarter,
            total_sales,
        })
        .collect()
}

/// Each county's share of the state-wide total, by total descending.
pub fn county_share(table: &CleanedTable) -> Vec<CountyShare> {
    let state = state_total(table);
    county_totals(table)
        .into_iter()
        .map(|ct| CountyShare {
            share_pct: percent_2dp(ct.total_sales, state),
            county: ct.county,
            total_sales: ct.total_sales,
        })
        .collect()
}

/// The `n` counties with the highest totals. `n` must be positive.
pub fn top_n(table: &CleanedTable, n: i64) -> Result<Vec<CountyTotal>> {
    if n <= 0 {
        return Err(PipelineError::InvalidArgument(format!(
            "top-N requires a positive integer, got {}",
            n
        )));
    }
    let n = usize::try_from(n).unwrap_or(usize::MAX);
    Ok(county_totals(table).into_iter().take(n).collect())
}

/// Parse a caller-supplied top-N argument; anything but a positive integer is
/// an invalid argument.
pub fn parse_top_n(arg: &str) -> Result<i64> {
    let n: i64 = arg.trim().parse().map_err(|_| {
        PipelineError::InvalidArgument(format!("top-N requires a positive integer, got {:?}", arg))
    })?;
    if n <= 0 {
        return Err(PipelineError::InvalidArgument(format!(
            "top-N requires a positive integer, got {}",
            n
        )));
    }
    Ok(n)
}

/// Every report, evaluated once against the same table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBundle {
    pub summary: SummaryStats,
    pub yearly_totals: Vec<YearTotal>,
    pub year_over_year: Vec<YearOverYear>,
    pub quarterly_totals: Vec<QuarterTotal>,
    pub top_counties: Vec<CountyTotal>,
    pub bottom_counties: Vec<CountyTotal>,
    pub timeline: Vec<PeriodTotal>,
    pub county_share: Vec<CountyShare>,
    pub top_n: Vec<CountyTotal>,
}

#[tracing::instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn build_reports(table: &CleanedTable, n: i64) -> Result<ReportBundle> {
    let top_n = top_n(table, n)?;
    Ok(ReportBundle {
        summary: summary_stats(table),
        yearly_totals: yearly_totals(table),
        year_over_year: year_over_year(table),
        quarterly_totals: quarterly_totals(table),
        top_counties: top_counties(table),
        bottom_counties: bottom_counties(table),
        timeline: timeline(table),
        county_share: county_share(table),
        top_n,
    })
}
