// src/store/mod.rs
pub mod json;
pub mod tables;

pub use self::json::write_json;
pub use self::tables::{read_cleaned_table, write_cleaned_table, write_raw_table};

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::clean::CleanedTable;
use crate::report::{ReportBundle, View};

/// Where a run's artifacts live under the output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_table(&self) -> PathBuf {
        self.root.join("raw.parquet")
    }

    pub fn cleaned_table(&self) -> PathBuf {
        self.root.join("cleaned.parquet")
    }

    pub fn views_dir(&self) -> PathBuf {
        self.root.join("views")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }

    pub fn history_dir(&self) -> PathBuf {
        self.root.join("history")
    }
}

/// Materialize every named view, evaluated against `table`.
pub fn write_views(layout: &OutputLayout, table: &CleanedTable) -> Result<()> {
    let dir = layout.views_dir();
    for view in View::ALL {
        write_json(&dir, view.name(), &view.evaluate(table))?;
    }
    info!(dir = %dir.display(), views = View::ALL.len(), "wrote views");
    Ok(())
}

/// One JSON file per report.
pub fn write_reports(layout: &OutputLayout, bundle: &ReportBundle) -> Result<()> {
    let dir = layout.reports_dir();
    write_json(&dir, "summary", &bundle.summary)?;
    write_json(&dir, "yearly_totals", &bundle.yearly_totals)?;
    write_json(&dir, "year_over_year", &bundle.year_over_year)?;
    write_json(&dir, "quarterly_totals", &bundle.quarterly_totals)?;
    write_json(&dir, "top_counties", &bundle.top_counties)?;
    write_json(&dir, "bottom_counties", &bundle.bottom_counties)?;
    write_json(&dir, "timeline", &bundle.timeline)?;
    write_json(&dir, "county_share", &bundle.county_share)?;
    write_json(&dir, "top_n", &bundle.top_n)?;
    info!(dir = %dir.display(), "wrote reports");
    Ok(())
}
