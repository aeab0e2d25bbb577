use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::clean::{self, CleanedTable};
use crate::config::PipelineConfig;
use crate::history::{RunHistory, RunRecord};
use crate::ingest;
use crate::report::{self, ReportBundle};
use crate::store::{self, OutputLayout};

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub layout: OutputLayout,
    pub table: CleanedTable,
    pub reports: ReportBundle,
    pub run: RunRecord,
}

/// Ingest, clean, persist, report. Stops at the first failure; nothing after
/// the failing stage is written.
#[tracing::instrument(level = "info", skip(cfg), fields(input = %cfg.input, out_dir = %cfg.out_dir.display()))]
pub fn run(cfg: &PipelineConfig) -> Result<RunSummary> {
    cfg.validate()?;
    let started_at = Utc::now();
    let layout = OutputLayout::new(&cfg.out_dir);

    // ─── 1) ingestion ────────────────────────────────────────────────
    let raw = ingest::load_raw_sources(&cfg.input)?;
    store::write_raw_table(&layout.raw_table(), &raw)?;

    // ─── 2) cleaning & dedup ─────────────────────────────────────────
    let outcome = clean::clean(&raw, &cfg.clean_options()).context("cleaning raw records")?;
    store::write_cleaned_table(&layout.cleaned_table(), &outcome.table)?;
    info!(path = %layout.cleaned_table().display(), rows = outcome.table.len(), "persisted cleaned table");

    // ─── 3) views & reports ──────────────────────────────────────────
    let reports = report::build_reports(&outcome.table, cfg.top_n)?;
    store::write_views(&layout, &outcome.table)?;
    store::write_reports(&layout, &reports)?;

    let run = RunRecord {
        input: cfg.input.clone(),
        sources: raw
            .sources
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";"),
        raw_rows: raw.len() as u64,
        cleaned_rows: outcome.table.len() as u64,
        duplicates_removed: outcome.duplicates_removed as u64,
        rejected_rows: outcome.rejections.len() as u64,
        started_at,
        finished_at: Utc::now(),
    };
    RunHistory::new(layout.history_dir())?.record(&run)?;
    info!(
        raw_rows = run.raw_rows,
        cleaned_rows = run.cleaned_rows,
        elapsed_ms = (run.finished_at - run.started_at).num_milliseconds(),
        "run complete"
    );

    Ok(RunSummary {
        layout,
        table: outcome.table,
        reports,
        run,
    })
}

/// Load the cleaned table a previous run persisted under `layout`.
pub fn load_cleaned(layout: &OutputLayout) -> Result<CleanedTable> {
    let path = layout.cleaned_table();
    store::read_cleaned_table(&path)
        .with_context(|| format!("no usable cleaned table at {}; run the pipeline first", path.display()))
}
