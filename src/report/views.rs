use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use super::{county_totals, quarterly_totals, yearly_totals, CountyTotal, QuarterTotal, YearTotal};
use crate::clean::CleanedTable;
use crate::error::PipelineError;

/// Named aggregate definitions that downstream consumers can reference
/// without restating the grouping. Re-evaluated on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    YearlyTotals,
    QuarterlyTotals,
    CountyTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ViewRows {
    Yearly(Vec<YearTotal>),
    Quarterly(Vec<QuarterTotal>),
    County(Vec<CountyTotal>),
}

impl ViewRows {
    pub fn len(&self) -> usize {
        match self {
            ViewRows::Yearly(rows) => rows.len(),
            ViewRows::Quarterly(rows) => rows.len(),
            ViewRows::County(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl View {
    pub const ALL: [View; 3] = [View::YearlyTotals, View::QuarterlyTotals, View::CountyTotals];

    pub fn name(&self) -> &'static str {
        match self {
            View::YearlyTotals => "yearly_totals",
            View::QuarterlyTotals => "quarterly_totals",
            View::CountyTotals => "county_totals",
        }
    }

    pub fn evaluate(&self, table: &CleanedTable) -> ViewRows {
        match self {
            View::YearlyTotals => ViewRows::Yearly(yearly_totals(table)),
            View::QuarterlyTotals => ViewRows::Quarterly(quarterly_totals(table)),
            View::CountyTotals => ViewRows::County(county_totals(table)),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        View::ALL
            .into_iter()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| PipelineError::UnknownView(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clean::CleanedRecord;

    #[test]
    fn names_round_trip() {
        for view in View::ALL {
            assert_eq!(view.name().parse::<View>(), Ok(view));
        }
        assert_eq!(" County_Totals ".parse::<View>(), Ok(View::CountyTotals));
        assert_eq!(
            "monthly_totals".parse::<View>(),
            Err(PipelineError::UnknownView("monthly_totals".into()))
        );
    }

    #[test]
    fn views_reflect_the_table_they_are_given() {
        let a = CleanedTable::new(vec![CleanedRecord {
            year: 2020,
            quarter: 1,
            county: "Denver".into(),
            sales: 5,
        }])
        .unwrap();
        let b = CleanedTable::default();

        let view = View::YearlyTotals;
        assert_eq!(
            view.evaluate(&a),
            ViewRows::Yearly(vec![YearTotal {
                year: 2020,
                total_sales: 5
            }])
        );
        assert!(view.evaluate(&b).is_empty());
        assert_eq!(View::CountyTotals.evaluate(&a).len(), 1);
    }

    #[test]
    fn untagged_serialization_is_a_plain_array() {
        let rows = ViewRows::Quarterly(vec![QuarterTotal {
            quarter: 2,
            total_sales: 9,
        }]);
        let json = serde_json::to_string(&rows).unwrap();
        assert_eq!(json, r#"[{"quarter":2,"total_sales":9}]"#);
    }
}
